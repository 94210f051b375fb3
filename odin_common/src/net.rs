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

///! common utility functions for network operations

use std::{io::Write, path::Path};
use reqwest::{header::HeaderMap, Client, StatusCode, RequestBuilder};

use crate::{define_error, fs::pending_file_for};

define_error!{ pub OdinNetError =
    IOError(#[from] std::io::Error) : "IO error: {0}",
    NotFoundError(String) : "not found {0}",
    HttpError(#[from] reqwest::Error) : "http error: {0}",
    OpFailed(String) : "operation failed: {0}"
}

pub type Result<T> = std::result::Result<T, OdinNetError>;

fn with_headers (mut req: RequestBuilder, opt_headers: &Option<HeaderMap>)->RequestBuilder {
    if let Some(headermap) = &opt_headers {
        req = req.headers(headermap.clone())
    }
    req
}

/// retrieve URL content in chunks (to support large files) into a temp file next to `path`, which
/// is only renamed to `path` if the download completed. Returns the number of bytes written
pub async fn download_url (client: &Client, url: &str, opt_headers: &Option<HeaderMap>, path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let mut response = with_headers( client.get(url), opt_headers).send().await?;

    match response.status() {
        StatusCode::OK => {
            let mut file = pending_file_for(path)?;
            let mut len: u64 = 0;

            while let Some(chunk) = response.chunk().await? {
                len += chunk.len() as u64;
                file.write_all(&chunk)?;
            }
            file.flush()?;

            if len > 0 {
                file.persist(path).map_err(|e| e.error)?;
                Ok(len)
            } else {
                Err( OdinNetError::OpFailed(format!("empty response from {url}")))
            }
        }
        StatusCode::NOT_FOUND => {
            Err( OdinNetError::NotFoundError(format!("{url}")))
        }
        other => {
            Err( OdinNetError::OpFailed(format!("response status {other:?}")))
        }
    }
}

/// GET the text content of a URL
pub async fn get_text (client: &Client, url: &str, opt_headers: &Option<HeaderMap>) -> Result<String> {
    let response = with_headers( client.get(url), opt_headers).send().await?;

    match response.status() {
        StatusCode::OK => Ok( response.text().await? ),
        StatusCode::NOT_FOUND => Err( OdinNetError::NotFoundError(format!("{url}"))),
        other => Err( OdinNetError::OpFailed(format!("response status {other:?}")))
    }
}
