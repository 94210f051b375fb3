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

use std::{collections::{HashMap, HashSet}, path::Path, time::Duration};
use chrono::NaiveDate;

use odin_datastore::{
    config::RetryPolicy,
    errors::{Result, OdinDatastoreError},
    mirror::{MirrorOptions, RemoteSession, mirror_tree},
};

const FRP_GRANULE: &str = "S3A_SL_2_FRP____20230715T163524_20230715T163824_20230715T185213_0179_101_012_0540_PS1_O_NR_004.SEN3";

/// an in-memory remote tree
#[derive(Default)]
struct MockServer {
    dirs: HashMap<String,Vec<String>>, // dir path -> LIST lines
    files: HashMap<String,Vec<u8>>,    // file path -> content
    broken: HashSet<String>,           // dirs that can't be listed
    flaky: HashMap<String,usize>,      // dir or file path -> number of failing LIST/RETR calls left
    failing_cdups: usize,
    cwd: Vec<String>,
    n_retrieved: usize,
}

impl MockServer {
    fn fails_once_more (&mut self, path: &str)->bool {
        match self.flaky.get_mut( path) {
            Some(n) if *n > 0 => { *n -= 1; true }
            _ => false
        }
    }

    fn current (&self)->String {
        format!("/{}", self.cwd.join("/"))
    }

    fn child (&self, name: &str)->String {
        if self.cwd.is_empty() { format!("/{name}") } else { format!("{}/{}", self.current(), name) }
    }

    fn add_dir (&mut self, parent: &str, name: &str) {
        let path = if parent == "/" { format!("/{name}") } else { format!("{parent}/{name}") };
        self.dirs.entry( parent.to_string()).or_default().push( format!("drwxr-xr-x    2 ftp      ftp          4096 Jul 15 12:00 {name}"));
        self.dirs.entry( path).or_default();
    }

    fn add_file (&mut self, parent: &str, name: &str, content: &[u8]) {
        self.dirs.entry( parent.to_string()).or_default()
            .push( format!("-rw-r--r--    1 ftp      ftp      {:>8} Jul 15 12:00 {name}", content.len()));
        self.files.insert( format!("{parent}/{name}"), content.to_vec());
    }
}

fn failed (msg: String)->OdinDatastoreError {
    OdinDatastoreError::OpFailedError( msg)
}

impl RemoteSession for MockServer {
    fn cwd (&mut self, dir: &str)->Result<()> {
        let path = self.child( dir);
        if !self.dirs.contains_key( &path) {
            return Err( failed( format!("no such dir {path}")))
        }
        self.cwd.push( dir.to_string());
        Ok(())
    }

    fn cdup (&mut self)->Result<()> {
        if self.failing_cdups > 0 {
            self.failing_cdups -= 1;
            return Err( failed( "CDUP refused".into()))
        }
        self.cwd.pop().map( |_| ()).ok_or( failed( "already at root".into()))
    }

    fn list (&mut self)->Result<Vec<String>> {
        let path = self.current();
        if self.broken.contains( &path) || self.fails_once_more( &path) {
            return Err( failed( format!("can't list {path}")))
        }
        let mut lines = vec![ "total 42".to_string() ];
        lines.extend( self.dirs.get( &path).cloned().unwrap_or_default());
        Ok(lines)
    }

    fn retrieve (&mut self, name: &str, local: &Path)->Result<u64> {
        let path = self.child( name);
        if self.fails_once_more( &path) {
            return Err( failed( format!("transfer of {path} aborted")))
        }
        let content = self.files.get( &path).ok_or( failed( format!("no such file {path}")))?.clone();
        std::fs::write( local, &content)?;
        self.n_retrieved += 1;
        Ok( content.len() as u64)
    }
}

fn frp_server ()->MockServer {
    let mut server = MockServer::default();
    server.dirs.insert( "/".into(), Vec::new());

    server.add_dir( "/", "NRT_like_data");
    server.add_dir( "/NRT_like_data", "20230630");
    server.add_file( "/NRT_like_data/20230630", "FRP_in.nc", b"old");

    server.add_dir( "/NRT_like_data", "20230715");
    server.add_file( "/NRT_like_data/20230715", "readme.txt", b"hello");
    server.add_dir( "/NRT_like_data/20230715", FRP_GRANULE);
    let granule = format!("/NRT_like_data/20230715/{FRP_GRANULE}");
    server.add_file( &granule, "FRP_in.nc", b"fires in");
    server.add_file( &granule, "FRP_an.nc", b"fires an");

    server.add_dir( "/NRT_like_data", "S3A_SL_1_RBT____20230715T163524");
    server.add_file( "/NRT_like_data/S3A_SL_1_RBT____20230715T163524", "S7_BT_in.nc", b"level 1");

    server
}

fn options ()->MirrorOptions {
    MirrorOptions {
        exclude_pattern: "SL_1_RBT".into(),
        cutoff: NaiveDate::from_ymd_opt( 2023, 7, 1),
        retry: RetryPolicy::new( 2, Duration::ZERO),
    }
}

#[test]
fn test_incremental_mirror()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let local = tmp.path();
    let mut server = frp_server();

    let downloaded = mirror_tree( &mut server, "NRT_like_data", local, &options())?;
    assert_eq!( downloaded.len(), 3);
    assert_eq!( server.n_retrieved, 3);

    let frp_in = local.join("20230715").join( FRP_GRANULE).join("FRP_in.nc");
    assert_eq!( std::fs::read( &frp_in)?, b"fires in");
    assert!( local.join("20230715/readme.txt").is_file());

    assert!( !local.join("20230630").exists()); // before cutoff
    assert!( !local.join("S3A_SL_1_RBT____20230715T163524").exists()); // excluded

    // the walk returns to where it started
    assert_eq!( server.current(), "/NRT_like_data");

    // a second run does not transfer anything
    server.cwd.clear();
    let downloaded = mirror_tree( &mut server, "NRT_like_data", local, &options())?;
    assert!( downloaded.is_empty());
    assert_eq!( server.n_retrieved, 3);
    Ok(())
}

#[test]
fn test_broken_subdir()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut server = frp_server();
    server.add_dir( "/NRT_like_data", "20230716");
    server.add_file( "/NRT_like_data/20230716", "FRP_in.nc", b"unreachable");
    server.broken.insert( "/NRT_like_data/20230716".into());

    let downloaded = mirror_tree( &mut server, "NRT_like_data", tmp.path(), &options())?;
    assert_eq!( downloaded.len(), 3);
    assert!( !tmp.path().join("20230716").exists());
    assert_eq!( server.current(), "/NRT_like_data");
    Ok(())
}

#[test]
fn test_missing_root() {
    let tmp = tempfile::tempdir().unwrap();
    let mut server = frp_server();
    assert!( mirror_tree( &mut server, "no_such_dir", tmp.path(), &options()).is_err());
}

#[test]
fn test_transient_failures()->Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut server = frp_server();
    let granule = format!("/NRT_like_data/20230715/{FRP_GRANULE}");
    server.flaky.insert( granule.clone(), 1);
    server.flaky.insert( format!("{granule}/FRP_in.nc"), 1);

    let downloaded = mirror_tree( &mut server, "NRT_like_data", tmp.path(), &options())?;
    assert_eq!( downloaded.len(), 3);
    assert_eq!( server.n_retrieved, 3);
    assert!( tmp.path().join("20230715").join( FRP_GRANULE).join("FRP_in.nc").is_file());
    assert_eq!( server.current(), "/NRT_like_data");
    Ok(())
}

#[test]
fn test_lost_remote_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let mut server = MockServer::default();
    server.dirs.insert( "/".into(), Vec::new());
    server.add_dir( "/", "R");
    server.add_dir( "/R", "A");
    server.add_dir( "/R", "B");
    server.add_file( "/R/B", "FRP_in.nc", b"fires");
    server.broken.insert( "/R/A".into());
    server.failing_cdups = 1;

    let res = mirror_tree( &mut server, "R", tmp.path(), &options());
    assert!( matches!( res, Err(OdinDatastoreError::RemoteDirLost(_))));
    assert_eq!( server.n_retrieved, 0);
}
