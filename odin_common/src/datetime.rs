/*
 * Copyright © 2024, United States Government, as represented by the Administrator of
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

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize,Serializer,Deserializer};
use std::time::Duration;
use parse_duration::parse;

/// this should be used wherever we might have to use sim clock instead of wall clock
#[inline]
pub fn utc_now()->DateTime<Utc> {
    Utc::now()
}

/// get a DateTime<Utc> from a NaiveDate that is supposed to be in Utc
pub fn naive_utc_date_to_utc_datetime (nd: NaiveDate) -> DateTime<Utc> {
    NaiveDateTime::new(nd, NaiveTime::MIN).and_utc()
}

/// parse a "YYYY-MM-DD" date
pub fn parse_ymd (s: &str)->Option<NaiveDate> {
    NaiveDate::parse_from_str( s.trim(), "%Y-%m-%d").ok()
}

/// parse compact "YYYYMMDDThhmmss" timestamps as they are used in satellite product names
pub fn parse_compact_utc (s: &str)->Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str( s, "%Y%m%dT%H%M%S").ok().map(|ndt| ndt.and_utc())
}

/// iterator over all days in [first,last] (inclusive)
pub fn days_inclusive (first: NaiveDate, last: NaiveDate)->impl Iterator<Item=NaiveDate> {
    let mut next = Some(first);
    std::iter::from_fn( move || {
        match next {
            Some(d) if d <= last => {
                next = d.checked_add_days( Days::new(1));
                Some(d)
            }
            _ => None
        }
    })
}

//--- support for serde

/// deserialize durations from human readable strings such as "3s" or "2min"
pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> Result<S::Ok, S::Error>  {
    let dfm = format!("{:?}", dur);
    s.serialize_str(&dfm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_inclusive() {
        let first = NaiveDate::from_ymd_opt(2023, 6, 29).unwrap();
        let last = NaiveDate::from_ymd_opt(2023, 7, 2).unwrap();
        let days: Vec<NaiveDate> = days_inclusive(first, last).collect();
        assert_eq!( days.len(), 4);
        assert_eq!( days[3], last);

        assert_eq!( days_inclusive(last, first).count(), 0);
    }

    #[test]
    fn test_compact() {
        let dt = parse_compact_utc("20230715T163524").unwrap();
        assert_eq!( dt.to_rfc3339(), "2023-07-15T16:35:24+00:00");
        assert!( parse_compact_utc("20230715").is_none());
    }
}
