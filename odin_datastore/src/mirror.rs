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

//! recursive mirroring of a remote (FTP) directory tree into a local directory. Files that already
//! exist locally are not transferred again, so the mirror can be re-run incrementally.

use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use suppaftp::{FtpError, NativeTlsConnector, NativeTlsFtpStream, native_tls::TlsConnector, types::FileType};
use tracing::{debug, info, warn};

use odin_common::fs::{ensure_dir, pending_file_for};
use crate::{
    config::RetryPolicy,
    errors::{Result, op_failed, OdinDatastoreError},
    retry::{retry_blocking, retry_blocking_if},
};

/// the operations the mirror walk needs from a remote server. The walk is stateful - `cwd` and `cdup`
/// change the current remote directory
pub trait RemoteSession {
    /// change into `dir`, which is relative to the current remote directory unless absolute
    fn cwd (&mut self, dir: &str)->Result<()>;

    fn cdup (&mut self)->Result<()>;

    /// raw (unix `ls -l` style) listing lines of the current remote directory
    fn list (&mut self)->Result<Vec<String>>;

    /// transfer the remote file `name` of the current directory to `local`. Returns number of bytes
    fn retrieve (&mut self, name: &str, local: &Path)->Result<u64>;
}

/* #region FTP session ***********************************************************************************/

/// a logged in FTP session, optionally upgraded to explicit FTPS (AUTH TLS) with protected data channel
pub struct FtpSession {
    stream: NativeTlsFtpStream,
}

impl FtpSession {
    pub fn connect (host: &str, domain: &str, use_tls: bool, user: &str, pw: &str)->Result<Self> {
        let mut stream = NativeTlsFtpStream::connect( host)?;
        if use_tls {
            let connector = TlsConnector::new().map_err( |e| op_failed!("failed to create TLS connector: {}", e))?;
            stream = stream.into_secure( NativeTlsConnector::from( connector), domain)?;
        }
        stream.login( user, pw)?;
        stream.transfer_type( FileType::Binary)?;
        info!("logged into {} (tls: {})", host, use_tls);

        Ok( FtpSession { stream } )
    }

    pub fn quit (mut self)->Result<()> {
        Ok( self.stream.quit()? )
    }
}

impl RemoteSession for FtpSession {
    fn cwd (&mut self, dir: &str)->Result<()> {
        Ok( self.stream.cwd( dir)? )
    }

    fn cdup (&mut self)->Result<()> {
        Ok( self.stream.cdup()? )
    }

    fn list (&mut self)->Result<Vec<String>> {
        Ok( self.stream.list( None)? )
    }

    fn retrieve (&mut self, name: &str, local: &Path)->Result<u64> {
        let mut file = pending_file_for( local)?;
        let len = self.stream.retr( name, |reader| {
            std::io::copy( reader, &mut file).map_err( FtpError::ConnectionError)
        })?;
        file.persist( local).map_err( |e| OdinDatastoreError::IOError(e.error))?;
        Ok(len)
    }
}

/* #endregion FTP session */

/* #region listing ***************************************************************************************/

#[derive(Debug,Clone,PartialEq,Eq)]
pub enum RemoteEntry {
    Dir(String),
    File(String),
}

/// parse a unix style LIST line ("drwxr-xr-x 2 user group 4096 Jul 15 12:00 20230715").
/// Lines with less than 9 fields are ignored. The name is everything after the 8th field
pub fn parse_list_line (line: &str)->Option<RemoteEntry> {
    let mut rest = line.trim_start();
    for _ in 0..8 {
        let end = rest.find( char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }
    let name = rest.trim_end();

    if name.is_empty() || name == "." || name == ".." {
        None
    } else if line.starts_with('d') {
        Some( RemoteEntry::Dir( name.to_string()))
    } else {
        Some( RemoteEntry::File( name.to_string()))
    }
}

/* #endregion listing */

/* #region walk ******************************************************************************************/

#[derive(Debug,Clone)]
pub struct MirrorOptions {
    /// sub directories containing this are skipped
    pub exclude_pattern: String,
    /// date named (YYYYMMDD) sub directories before this are skipped
    pub cutoff: Option<NaiveDate>,
    pub retry: RetryPolicy,
}

impl MirrorOptions {
    pub fn is_excluded (&self, dir_name: &str)->bool {
        if !self.exclude_pattern.is_empty() && dir_name.contains( self.exclude_pattern.as_str()) {
            return true
        }
        match (self.cutoff, NaiveDate::parse_from_str( dir_name, "%Y%m%d")) {
            (Some(cutoff), Ok(date)) => date < cutoff,
            _ => false
        }
    }
}

/// change into `dir` and list it. If the listing fails after we entered the directory we leave it
/// again before the next attempt. If we can't leave it we don't know where we are anymore, which
/// ends the walk
fn enter_and_list<S: RemoteSession> (session: &mut S, dir: &str, retry: &RetryPolicy)->Result<Vec<String>> {
    retry_blocking_if( retry, &format!("listing {dir}"), || -> Result<Vec<String>> {
        session.cwd( dir)?;
        match session.list() {
            Ok(lines) => Ok(lines),
            Err(e) => {
                session.cdup().map_err( |e_up| OdinDatastoreError::RemoteDirLost( format!("{dir} ({e_up})")))?;
                Err(e)
            }
        }
    }, |e: &OdinDatastoreError| !matches!( e, OdinDatastoreError::RemoteDirLost(_)))
}

fn walk_dir<S: RemoteSession> (session: &mut S, lines: Vec<String>, local_dir: &Path, opts: &MirrorOptions, downloaded: &mut Vec<PathBuf>)->Result<()> {
    for line in &lines {
        match parse_list_line( line) {
            Some( RemoteEntry::Dir(name)) => {
                if opts.is_excluded( &name) {
                    debug!("skipping remote dir {}", name);
                    continue
                }

                let sub_lines = match enter_and_list( session, &name, &opts.retry) {
                    Ok(sub_lines) => sub_lines,
                    Err(e @ OdinDatastoreError::RemoteDirLost(_)) => return Err(e),
                    Err(e) => { warn!("skipping remote dir {}: {}", name, e); continue }
                };

                info!("mirroring remote dir {}", name);
                match walk_dir( session, sub_lines, &local_dir.join( &name), opts, downloaded) {
                    Err(e @ OdinDatastoreError::RemoteDirLost(_)) => return Err(e),
                    res => {
                        // remaining entries are relative to this dir
                        session.cdup().map_err( |e| OdinDatastoreError::RemoteDirLost( format!("{name} ({e})")))?;
                        if let Err(e) = res {
                            warn!("incomplete mirror of remote dir {}: {}", name, e);
                        }
                    }
                }
            }
            Some( RemoteEntry::File(name)) => {
                let local = local_dir.join( &name);
                if local.exists() {
                    debug!("{:?} already exists", local);
                    continue
                }

                ensure_dir( local_dir)?;
                match retry_blocking( &opts.retry, &format!("downloading {name}"), || session.retrieve( &name, &local)) {
                    Ok(len) => {
                        debug!("downloaded {:?} ({} bytes)", local, len);
                        downloaded.push( local);
                    }
                    Err(e) => warn!("failed to download {}: {}", name, e)
                }
            }
            None => {}
        }
    }
    Ok(())
}

/// mirror the remote tree at `remote_root` into `local_root`, returning the newly downloaded files.
/// Failing to list the root is an error, failures in sub directories only cut off that branch
pub fn mirror_tree<S: RemoteSession> (session: &mut S, remote_root: &str, local_root: &Path, opts: &MirrorOptions)->Result<Vec<PathBuf>> {
    ensure_dir( local_root)?;
    let lines = enter_and_list( session, remote_root, &opts.retry)?;

    let mut downloaded: Vec<PathBuf> = Vec::new();
    walk_dir( session, lines, local_root, opts, &mut downloaded)?;

    info!("mirrored {} to {:?}: {} new files", remote_root, local_root, downloaded.len());
    Ok(downloaded)
}

/* #endregion walk */
