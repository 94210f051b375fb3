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

//! client for the EUMETSAT Data Store REST API (token, OpenSearch product search and product download).
//! See https://user.eumetsat.int/resources/user-guides/data-store-detailed-guide

use std::{path::{Path, PathBuf}, time::{Duration, Instant}};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header::{AUTHORIZATION, HeaderMap, HeaderValue}};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use odin_common::{fs::is_non_empty_file, net::download_url, wkt_polygon};
use crate::{
    config::{EumetsatConfig, EUMETSAT_KEY, EUMETSAT_SECRET},
    errors::{Result, OdinDatastoreError, env_credential, op_failed},
    retry::retry_async,
};

/// where we get (zipped) products from. This is the seam that separates acquisition logic from the
/// remote service
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// ids of all products sensed within [start,end)
    async fn search (&self, start: DateTime<Utc>, end: DateTime<Utc>)->Result<Vec<String>>;

    /// download product `id` into `dir`, returning the path of the zip file
    async fn download (&self, id: &str, dir: &Path)->Result<PathBuf>;
}

#[derive(Debug,Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct AccessToken {
    token: String,
    expires: Instant,
}

#[derive(Debug,Deserialize)]
#[serde(rename_all="camelCase")]
struct SearchResponse {
    total_results: Option<usize>,
    #[serde(default)]
    features: Vec<SearchFeature>,
}

#[derive(Debug,Deserialize)]
struct SearchFeature {
    id: Option<String>,
    properties: Option<SearchProperties>,
}

#[derive(Debug,Deserialize)]
struct SearchProperties {
    identifier: Option<String>,
}

impl SearchFeature {
    fn product_id (self)->Option<String> {
        self.id.or( self.properties.and_then( |p| p.identifier))
    }
}

/// the product ids of a search result page and the total number of results (if reported)
pub fn parse_search_page (json: &str)->Result<(Vec<String>,Option<usize>)> {
    let response: SearchResponse = serde_json::from_str( json)?;
    let ids = response.features.into_iter().filter_map( |f| f.product_id()).collect();
    Ok( (ids, response.total_results) )
}

pub fn opensearch_time (dt: &DateTime<Utc>)->String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub struct EumetsatStore {
    client: Client,
    config: EumetsatConfig,
    key: String,
    secret: String,
    token: Mutex<Option<AccessToken>>,
}

impl EumetsatStore {
    pub fn new (config: EumetsatConfig, key: String, secret: String)->Self {
        EumetsatStore { client: Client::new(), config, key, secret, token: Mutex::new(None) }
    }

    /// fails with MissingCredentials if consumer key or secret are not in our environment
    pub fn from_env (config: EumetsatConfig)->Result<Self> {
        let key = env_credential( EUMETSAT_KEY)?;
        let secret = env_credential( EUMETSAT_SECRET)?;
        Ok( Self::new( config, key, secret) )
    }

    async fn request_token (&self)->Result<AccessToken> {
        let response = self.client.post( &self.config.token_url)
            .basic_auth( &self.key, Some(&self.secret))
            .form( &[("grant_type", "client_credentials")])
            .send().await?;

        if response.status() != StatusCode::OK {
            return Err( op_failed!("token request failed with status {}", response.status()))
        }

        let tr: TokenResponse = response.json().await?;
        // renew a minute early
        let lifetime = Duration::from_secs( tr.expires_in.unwrap_or(3600).saturating_sub(60));
        debug!("got Data Store token valid for {:?}", lifetime);
        Ok( AccessToken { token: tr.access_token, expires: Instant::now() + lifetime } )
    }

    /// the current bearer token, requesting a new one if there is none or it has expired
    pub async fn bearer_token (&self)->Result<String> {
        let mut token = self.token.lock().await;
        if let Some(t) = token.as_ref() {
            if t.expires > Instant::now() {
                return Ok( t.token.clone())
            }
        }

        let t = self.request_token().await?;
        let s = t.token.clone();
        *token = Some(t);
        Ok(s)
    }

    async fn search_page (&self, start: &DateTime<Utc>, end: &DateTime<Utc>, start_index: usize)->Result<(Vec<String>,Option<usize>)> {
        let token = self.bearer_token().await?;
        let geo = wkt_polygon( &self.config.roi);
        let dtstart = opensearch_time( start);
        let dtend = opensearch_time( end);
        let si = start_index.to_string();
        let c = self.config.page_size.to_string();

        let response = self.client.get( &self.config.search_url)
            .bearer_auth( &token)
            .query( &[
                ("pi", self.config.collection.as_str()),
                ("geo", geo.as_str()),
                ("dtstart", dtstart.as_str()),
                ("dtend", dtend.as_str()),
                ("format", "json"),
                ("si", si.as_str()),
                ("c", c.as_str()),
            ])
            .send().await?;

        if response.status() != StatusCode::OK {
            return Err( op_failed!("search failed with status {}", response.status()))
        }

        let text = response.text().await?;
        parse_search_page( &text)
    }

    async fn search_all (&self, start: &DateTime<Utc>, end: &DateTime<Utc>)->Result<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        loop {
            let (page, total) = self.search_page( start, end, ids.len()).await?;
            let n = page.len();
            ids.extend( page);

            if n == 0 || n < self.config.page_size || total.map( |t| ids.len() >= t).unwrap_or(false) {
                break
            }
        }
        Ok(ids)
    }

    pub fn product_url (&self, id: &str)->Result<String> {
        let mut url = Url::parse( &self.config.download_url).map_err( |e| op_failed!("invalid download url: {}", e))?;
        url.path_segments_mut()
            .map_err( |_| op_failed!("download url can't be a base"))?
            .pop_if_empty()
            .extend( &["collections", self.config.collection.as_str(), "products", id]);
        Ok( url.to_string() )
    }
}

#[async_trait]
impl ProductStore for EumetsatStore {
    async fn search (&self, start: DateTime<Utc>, end: DateTime<Utc>)->Result<Vec<String>> {
        let ids = retry_async( &self.config.retry, "product search", || self.search_all( &start, &end)).await?;
        info!("found {} products between {} and {}", ids.len(), start, end);
        Ok(ids)
    }

    async fn download (&self, id: &str, dir: &Path)->Result<PathBuf> {
        let path = dir.join( format!("{id}.zip"));
        if is_non_empty_file( &path) {
            debug!("{:?} already downloaded", path);
            return Ok(path)
        }

        let url = self.product_url( id)?;
        let (url, tgt) = (url.as_str(), path.as_path());
        let len = retry_async( &self.config.retry, &format!("download {id}"), move || async move {
            let token = self.bearer_token().await?;
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str( &format!("Bearer {token}")).map_err( |e| op_failed!("invalid token: {}", e))?;
            headers.insert( AUTHORIZATION, value);
            Ok::<u64,OdinDatastoreError>( download_url( &self.client, url, &Some(headers), tgt).await? )
        }).await?;

        info!("downloaded {:?} ({} bytes)", path, len);
        Ok(path)
    }
}
