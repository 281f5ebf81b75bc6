//! Wire types for the remote profile feed.
//!
//! The feed is a conventional paginated JSON API; these structs mirror its
//! response shape exactly and never reach the store or the presentation
//! layer directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesResponse {
    pub results: Vec<RemoteProfile>,
    pub info: PageInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub seed: Option<String>,
    pub results: Option<i64>,
    pub page: Option<i64>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteProfile {
    pub login: RemoteLogin,
    pub name: RemoteName,
    pub email: String,
    pub dob: RemoteDob,
    pub location: RemoteLocation,
    pub picture: RemotePicture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLogin {
    pub uuid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteName {
    pub title: String,
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDob {
    pub date: String,
    pub age: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLocation {
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePicture {
    pub large: String,
    pub medium: String,
    pub thumbnail: String,
}
