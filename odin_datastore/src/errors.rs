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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdinDatastoreError>;

#[derive(Error,Debug)]
pub enum OdinDatastoreError {

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("serde error {0}")]
    SerdeError( #[from] serde_json::Error),

    #[error("config error {0}")]
    ConfigError( #[from] ron::error::SpannedError),

    #[error("ftp error {0}")]
    FtpError( #[from] suppaftp::FtpError),

    #[error("csv error {0}")]
    CsvError( #[from] csv::Error),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("net error {0}")]
    NetError( #[from] odin_common::net::OdinNetError),

    #[error("zip error {0}")]
    ZipError( #[from] zip::result::ZipError),

    #[error("xml error {0}")]
    XmlError( #[from] quick_xml::Error),

    #[error("GDAL error {0}")]
    GdalError( #[from] odin_gdal::errors::OdinGdalError),

    #[error("task join error {0}")]
    JoinError( #[from] tokio::task::JoinError),

    #[error("missing credentials: {0} not set")]
    MissingCredentials( String ),

    #[error("missing input {0}")]
    MissingInput( String ),

    #[error("lost track of remote directory {0}")]
    RemoteDirLost( String ),

    #[error("invalid date {0}")]
    InvalidDate( String ),

    #[error("operation failed {0}")]
    OpFailedError(String),
}

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::OdinDatastoreError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;

/// get the value of a required secret from the environment
pub fn env_credential (var: &str)->Result<String> {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err( OdinDatastoreError::MissingCredentials( var.to_string()))
    }
}
