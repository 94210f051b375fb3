/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! fixed-delay retry of fallible operations. The last error is returned once attempts are exhausted

use std::future::Future;
use tracing::warn;

use crate::config::RetryPolicy;

pub async fn retry_async<T,E,F,Fut> (policy: &RetryPolicy, what: &str, mut op: F)->Result<T,E>
    where F: FnMut()->Fut, Fut: Future<Output=Result<T,E>>, E: std::fmt::Display
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt >= policy.attempts {
                    return Err(e)
                }
                warn!("{what} failed (attempt {attempt}/{}): {e}", policy.attempts);
                attempt += 1;
                tokio::time::sleep( policy.delay).await;
            }
        }
    }
}

pub fn retry_blocking<T,E,F> (policy: &RetryPolicy, what: &str, op: F)->Result<T,E>
    where F: FnMut()->Result<T,E>, E: std::fmt::Display
{
    retry_blocking_if( policy, what, op, |_| true)
}

/// like [`retry_blocking`] but errors for which `is_transient` returns false are not retried
pub fn retry_blocking_if<T,E,F,P> (policy: &RetryPolicy, what: &str, mut op: F, is_transient: P)->Result<T,E>
    where F: FnMut()->Result<T,E>, P: Fn(&E)->bool, E: std::fmt::Display
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt >= policy.attempts || !is_transient(&e) {
                    return Err(e)
                }
                warn!("{what} failed (attempt {attempt}/{}): {e}", policy.attempts);
                attempt += 1;
                std::thread::sleep( policy.delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_blocking_attempts() {
        let policy = RetryPolicy::new( 3, Duration::from_millis(1));

        let mut n = 0;
        let res: Result<(),String> = retry_blocking( &policy, "always failing", || { n += 1; Err(format!("fail {n}")) });
        assert_eq!( n, 3);
        assert_eq!( res, Err("fail 3".to_string()));

        let mut n = 0;
        let res: Result<usize,String> = retry_blocking( &policy, "second time", || { n += 1; if n < 2 { Err("no".into()) } else { Ok(n) } });
        assert_eq!( res, Ok(2));
    }

    #[test]
    fn test_permanent_error() {
        let policy = RetryPolicy::new( 3, Duration::from_millis(1));
        let mut n = 0;
        let res: Result<(),String> = retry_blocking_if( &policy, "permanent", || { n += 1; Err("fatal".to_string()) }, |e: &String| e != "fatal");
        assert_eq!( res, Err("fatal".to_string()));
        assert_eq!( n, 1);
    }

    #[tokio::test]
    async fn test_async_attempts() {
        let policy = RetryPolicy::new( 2, Duration::from_millis(1));
        let mut n = 0;
        let res: Result<(),String> = retry_async( &policy, "async", || { n += 1; async { Err("x".to_string()) } }).await;
        assert!( res.is_err());
        assert_eq!( n, 2);
    }
}
