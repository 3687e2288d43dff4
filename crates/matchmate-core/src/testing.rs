//! Scripted profile source for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use matchmate_client::{ClientError, ProfileSource};
use matchmate_types::api::{Id, Location, Name, Picture, UserProfileResponse, UserResponse};

pub fn user(uid: &str) -> UserProfileResponse {
    UserProfileResponse {
        email: format!("{}@example.com", uid),
        gender: "female".into(),
        name: Name {
            first: "Test".into(),
            last: uid.to_string(),
        },
        location: Location {
            city: "Porto".into(),
            state: "Norte".into(),
        },
        id: Id {
            name: Some("NIF".into()),
            value: Some(uid.to_string()),
        },
        phone: "22-000".into(),
        cell: "91-000".into(),
        picture: Picture {
            large: format!("https://img/{}/l.jpg", uid),
            medium: format!("https://img/{}/m.jpg", uid),
            thumbnail: format!("https://img/{}/t.jpg", uid),
        },
    }
}

pub fn batch(uids: &[&str]) -> Result<UserResponse, ClientError> {
    Ok(UserResponse {
        results: uids.iter().map(|u| user(u)).collect(),
        info: None,
    })
}

pub fn outage() -> Result<UserResponse, ClientError> {
    Err(ClientError::Status {
        status: 503,
        body: "down for maintenance".into(),
    })
}

/// Hands out queued responses in order; an empty queue yields an empty batch.
#[derive(Default)]
pub struct ScriptedSource {
    queue: Mutex<VecDeque<Result<UserResponse, ClientError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<UserResponse, ClientError>>) -> Self {
        Self {
            queue: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProfileSource for ScriptedSource {
    async fn fetch_profiles(&self, _results: u32) -> Result<UserResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| batch(&[]))
    }
}
