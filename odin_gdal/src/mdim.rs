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

//! access to NetCDF variables through the GDAL multidimensional raster API

use std::path::Path;
use gdal::{Dataset, DatasetOptions, GdalOpenFlags, cpl::CslStringList};

use crate::{run_quiet, errors::Result};

/// a named 1-D variable with its (already scaled) values
#[derive(Debug,Clone,PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

pub fn open_multidim (path: impl AsRef<Path>)->Result<Dataset> {
    let path = path.as_ref();
    run_quiet( || {
        let opts = DatasetOptions { open_flags: GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER, ..Default::default() };
        Ok( Dataset::open_ex( path, opts)? )
    })
}

/// size of the named dimension of the root group, None if there is no such dimension
pub fn dimension_size (ds: &Dataset, dim_name: &str)->Result<Option<usize>> {
    let root = ds.root_group()?;
    let dims = root.dimensions( CslStringList::new())?;
    Ok( dims.iter().find( |d| d.name() == dim_name).map( |d| d.size()) )
}

/// read all 1-D variables of the root group that are defined over `dim_name`. Values get
/// `scale_factor` and `add_offset` applied if the variable has those attributes.
/// Returns None if the dimension does not exist or is empty
pub fn read_1d_columns (path: impl AsRef<Path>, dim_name: &str)->Result<Option<Vec<Column>>> {
    let ds = open_multidim( path)?;

    let n = match dimension_size( &ds, dim_name)? {
        Some(n) if n > 0 => n,
        _ => return Ok(None)
    };

    let root = ds.root_group()?;
    let mut columns: Vec<Column> = Vec::new();

    for name in root.array_names( CslStringList::new()) {
        let arr = root.open_md_array( &name, CslStringList::new())?;
        let dims = arr.dimensions()?;
        if dims.len() != 1 || dims[0].name() != dim_name { continue }

        let scale = arr.attribute("scale_factor").map( |a| a.read_as_f64()).unwrap_or(1.0);
        let offset = arr.attribute("add_offset").map( |a| a.read_as_f64()).unwrap_or(0.0);
        let no_data = arr.no_data_value_as_double();

        let raw: Vec<f64> = arr.read_as::<f64>( vec![0], vec![n])?;
        let values = raw.into_iter().map( |v| {
            if no_data.map( |nd| nd == v).unwrap_or(false) { f64::NAN } else { v * scale + offset }
        }).collect();

        columns.push( Column { name, values });
    }

    Ok( Some(columns) )
}
