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

use std::fs::{self,DirEntry};
use std::io::{self,Write,ErrorKind};
use std::path::{Path,PathBuf};
use regex::Regex;
use tempfile::NamedTempFile;

use crate::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

pub fn filename<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_name().and_then(|ostr| ostr.to_str())
}

pub fn extension<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().extension().and_then(|ostr| ostr.to_str())
}

pub fn filestem <'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_stem().and_then(|ostr| ostr.to_str())
}

/// name of the directory that contains `path` (not the full parent path)
pub fn parent_dirname<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().parent().and_then(|p| p.file_name()).and_then(|ostr| ostr.to_str())
}

pub fn ensure_dir (path: impl AsRef<Path>)->io::Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// check if dir pathname exists and is writable, try to create dir otherwise
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        let md = fs::metadata(&path)?;
        if md.permissions().readonly() {
            Err(io_error!(ErrorKind::PermissionDenied, "output_dir {:?} not writable", &path))
        } else {
            Ok(())
        }

    } else {
        fs::create_dir_all(path)
    }
}

pub fn path_to_lossy_string (path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().as_ref().to_string()
}

/// this is our "already have it" check - we don't compare content, existence and non-zero length suffices
pub fn is_non_empty_file <P: AsRef<Path>> (path: P) -> bool {
    fs::metadata(path).map( |meta| meta.is_file() && meta.len() > 0).unwrap_or(false)
}

/// write contents to a temp file in the target dir and then rename, so that readers never see partial files
pub fn write_file_atomic <P: AsRef<Path>> (path: P, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().ok_or( io_error!(ErrorKind::InvalidInput, "no parent dir for {:?}", path))?;
    ensure_dir(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// create a named temp file in the directory of `path` that can be persisted as `path` once it is complete
pub fn pending_file_for <P: AsRef<Path>> (path: P) -> Result<NamedTempFile> {
    let path = path.as_ref();
    let dir = path.parent().ok_or( io_error!(ErrorKind::InvalidInput, "no parent dir for {:?}", path))?;
    ensure_dir(dir)?;
    NamedTempFile::new_in(dir)
}

pub fn visit_dirs (dir: &Path, recursive: bool, cb: &mut dyn FnMut(&DirEntry)) -> io::Result<()> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                if recursive { visit_dirs(&path, recursive, cb)? }
            } else {
                cb(&entry);
            }
        }
    }
    Ok(())
}

pub fn matching_files_in_dir<P: AsRef<Path>> (dir: &P, fname_regex: &Regex) -> Result<Vec<PathBuf>> {
    let dir: &Path = dir.as_ref();
    let mut list: Vec<PathBuf> = Vec::new();

    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            if let Ok(entry) = entry {
                if entry.path().is_file() {
                    if let Some(fname) = entry.file_name().to_str() {
                        if fname_regex.is_match( fname) {
                            list.push(entry.path())
                        }
                    }
                }
            }
        }
    }
    list.sort();

    Ok(list)
}

/// all files with given (lower case, without '.') extension in dir, optionally descending into sub dirs.
/// Result is sorted so that callers get a stable order
pub fn files_with_extension<P: AsRef<Path>> (dir: &P, ext: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut list: Vec<PathBuf> = Vec::new();
    let mut cb = |entry: &DirEntry| {
        let path = entry.path();
        if extension(&path).map(|e| e.eq_ignore_ascii_case(ext)).unwrap_or(false) {
            list.push(path);
        }
    };
    visit_dirs( dir.as_ref(), recursive, &mut cb)?;
    list.sort();

    Ok(list)
}

/// files with names matching the given regex anywhere below `dir`
pub fn matching_files_rec<P: AsRef<Path>> (dir: &P, fname_regex: &Regex) -> Result<Vec<PathBuf>> {
    let mut list: Vec<PathBuf> = Vec::new();
    let mut cb = |entry: &DirEntry| {
        if let Some(fname) = entry.file_name().to_str() {
            if fname_regex.is_match(fname) { list.push(entry.path()) }
        }
    };
    visit_dirs( dir.as_ref(), true, &mut cb)?;
    list.sort();

    Ok(list)
}

/// the path of a file that belongs to `path` (e.g. a manifest) by appending a suffix to its full filename
pub fn sibling_with_suffix (path: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let mut fname = path.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    fname.push(suffix);
    path.with_file_name(fname)
}
