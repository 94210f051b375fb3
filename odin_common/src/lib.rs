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

pub mod macros;
pub mod fs;
pub mod datetime;
pub mod net;

/// a generic lon/lat bounding box in degrees
#[derive(Debug,Copy,Clone,serde::Serialize,serde::Deserialize,PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new (west: f64, south: f64, east: f64, north: f64)->Self {
        BoundingBox { west, south, east, north }
    }

    /// the closed outline (ccw from north-west) as it is used for polygon queries
    pub fn outline (&self)->Vec<(f64,f64)> {
        vec![
            (self.west, self.north),
            (self.west, self.south),
            (self.east, self.south),
            (self.east, self.north),
            (self.west, self.north),
        ]
    }

    /// "w,s,e,n" with the given number of decimals
    pub fn to_csv_string (&self, decimals: usize)->String {
        format!("{:.*},{:.*},{:.*},{:.*}", decimals, self.west, decimals, self.south, decimals, self.east, decimals, self.north)
    }
}

/// WKT POLYGON of a closed lon/lat ring
pub fn wkt_polygon (ring: &[(f64,f64)])->String {
    let coords: Vec<String> = ring.iter().map(|(lon,lat)| format!("{} {}", lon, lat)).collect();
    format!("POLYGON(({}))", coords.join(","))
}
