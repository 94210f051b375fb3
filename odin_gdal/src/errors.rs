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

use thiserror::Error;
use gdal::errors::GdalError;

use crate::pc_char_to_string;

pub type Result<T> = std::result::Result<T, OdinGdalError>;

#[derive(Error,Debug)]
pub enum OdinGdalError {

    #[error("GDAL error {0}")]
    GdalError( #[from] GdalError),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("invalid path {0}")]
    InvalidPath( String ),

    #[error("raster dimensions do not match: {0}")]
    DimensionMismatch( String ),

    #[error("GDAL operation failed: {0}")]
    LastGdalError( String ),

    #[error("{0}")]
    MiscError( String ),
}

pub fn misc_error (msg: impl ToString)->OdinGdalError {
    OdinGdalError::MiscError(msg.to_string())
}

pub fn gdal_error (e: GdalError)->OdinGdalError {
    OdinGdalError::GdalError(e)
}

/// get the last error message reported by the GDAL C library (if any). Use this for
/// gdal_sys calls that only return null handles or CPLErr codes
pub fn last_gdal_error ()->OdinGdalError {
    let msg = unsafe { pc_char_to_string( gdal_sys::CPLGetLastErrorMsg()) };
    unsafe { gdal_sys::CPLErrorReset(); }
    OdinGdalError::LastGdalError( if msg.is_empty() { "unknown error".to_string() } else { msg })
}
