//! Request dispatch: parse, authenticate, gate on domain policy, touch the
//! vault.
//!
//! Privileged handlers follow one shape: validate the session (getting a
//! private MEK copy), re-check domain policy host-side, open the vault
//! bound at unlock, and run the operation through the service facade. The
//! MEK copy dies with the service at the end of the request.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::json;
use zeroize::Zeroizing;

use pk_core::{Service, ServiceError};
use pk_store::Paths;

use crate::domaincheck;
use crate::phishing;
use crate::protocol::{
    code, CredentialItem, Envelope, GetCredentialsRequest, PhishingCheckRequest, Response,
    SaveCredentialRequest, SessionRequest, UnlockRequest,
};
use crate::session::{SessionError, SessionManager};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Host {
    session: SessionManager,
}

impl Host {
    pub fn new() -> Self {
        Self {
            session: SessionManager::new(),
        }
    }

    pub fn clear_session(&self) {
        self.session.clear();
    }

    /// Route one request payload to its handler. Never panics; every failure
    /// becomes an error envelope.
    pub fn dispatch(&self, payload: &[u8]) -> Response {
        let envelope: Envelope = match serde_json::from_slice(payload) {
            Ok(env) => env,
            Err(_) => return Response::failure_with(code::BAD_JSON, "invalid json"),
        };

        match envelope.request_type.as_str() {
            "health" => Response::success(json!({ "version": VERSION })),
            "unlock" => match parse(payload) {
                Ok(req) => self.handle_unlock(req),
                Err(resp) => resp,
            },
            "lock" => match parse(payload) {
                Ok(req) => self.handle_lock(req),
                Err(resp) => resp,
            },
            "getCredentials" => match parse(payload) {
                Ok(req) => self.handle_get_credentials(req),
                Err(resp) => resp,
            },
            "saveCredential" => match parse(payload) {
                Ok(req) => self.handle_save_credential(req),
                Err(resp) => resp,
            },
            "phishingCheck" => match parse(payload) {
                Ok(req) => handle_phishing_check(req),
                Err(resp) => resp,
            },
            _ => Response::failure_with(code::UNSUPPORTED, "unsupported command"),
        }
    }

    fn handle_unlock(&self, mut req: UnlockRequest) -> Response {
        if req.dir.trim().is_empty() {
            return Response::failure_with(code::BAD_REQUEST, "vault directory required");
        }
        let master = Zeroizing::new(std::mem::take(&mut req.master_password));
        if master.is_empty() {
            return Response::failure_with(code::BAD_REQUEST, "master password required");
        }

        // A fresh unlock invalidates whatever session existed.
        self.session.clear();

        let dir = std::path::absolute(&req.dir).unwrap_or_else(|_| PathBuf::from(&req.dir));

        // No vault header, no unlock; avoids creating directories for typos.
        if pk_store::header::load_header(&Paths::new(&dir)).is_err() {
            return Response::failure_with(code::UNLOCK_FAILED, "unlock failed");
        }

        let svc = match Service::open(&dir) {
            Ok(svc) => svc,
            Err(e) => {
                tracing::debug!(error = %e, "vault open failed during unlock");
                return Response::failure_with(code::UNLOCK_FAILED, "unlock failed");
            }
        };

        let mek = match svc.unwrap_mek(&master) {
            Ok(mek) => mek,
            Err(_) => return Response::failure_with(code::UNLOCK_FAILED, "unlock failed"),
        };

        let (token, ttl_seconds) = self.session.establish(dir, mek);
        tracing::info!("session established");

        Response::success(json!({ "token": token, "ttlSeconds": ttl_seconds }))
    }

    fn handle_lock(&self, req: SessionRequest) -> Response {
        if let Err(e) = self.session.validate(&req.session_token, &req.nonce) {
            return session_error_response(e);
        }
        self.session.clear();
        tracing::info!("session locked");
        Response::success_empty()
    }

    fn handle_get_credentials(&self, req: GetCredentialsRequest) -> Response {
        let (mek, dir) = match self.session.validate(&req.session.session_token, &req.session.nonce)
        {
            Ok(ok) => ok,
            Err(e) => return session_error_response(e),
        };

        if req.domain_etld1.is_empty() || req.exact_host.is_empty() {
            return Response::failure(code::BAD_REQUEST);
        }
        if !domaincheck::allow_autofill(
            &req.domain_etld1,
            &req.exact_host,
            req.require_exact_host,
            &req.exact_host,
        ) {
            return Response::failure(code::ETLD_MISMATCH);
        }

        let mut svc = match Service::open(&dir) {
            Ok(svc) => svc,
            Err(_) => return Response::failure_with(code::DB_ERROR, "database unavailable"),
        };
        svc.attach_mek(mek);

        let username = match req.username.trim() {
            "" => None,
            user => Some(user),
        };
        let items: Vec<CredentialItem> = match svc.find_for_site(&req.domain_etld1, username) {
            Ok(found) => found
                .into_iter()
                .map(|c| CredentialItem {
                    username: c.username,
                    password: c.password.to_string(),
                })
                .collect(),
            Err(ServiceError::NotFound) => Vec::new(),
            Err(e) => {
                tracing::debug!(error = %e, "credential lookup failed");
                return Response::failure_with(code::DB_ERROR, "database unavailable");
            }
        };

        Response::success(json!({ "items": items }))
    }

    fn handle_save_credential(&self, mut req: SaveCredentialRequest) -> Response {
        let (mek, dir) = match self.session.validate(&req.session.session_token, &req.session.nonce)
        {
            Ok(ok) => ok,
            Err(e) => return session_error_response(e),
        };

        let password = Zeroizing::new(std::mem::take(&mut req.password));
        if req.domain_etld1.is_empty()
            || req.exact_host.is_empty()
            || req.username.trim().is_empty()
            || password.is_empty()
        {
            return Response::failure(code::BAD_REQUEST);
        }
        if !domaincheck::allow_autofill(
            &req.domain_etld1,
            &req.exact_host,
            req.require_exact_host,
            &req.exact_host,
        ) {
            return Response::failure(code::ETLD_MISMATCH);
        }

        let mut svc = match Service::open(&dir) {
            Ok(svc) => svc,
            Err(_) => return Response::failure_with(code::DB_ERROR, "database unavailable"),
        };
        svc.attach_mek(mek);

        match svc.add(&req.domain_etld1, req.username.trim(), &password) {
            Ok(id) => Response::success(json!({ "saved": true, "id": id })),
            Err(ServiceError::Crypto(_)) => Response::failure(code::ENCRYPT_FAILED),
            Err(e) => {
                tracing::debug!(error = %e, "credential save failed");
                Response::failure_with(code::DB_ERROR, "database unavailable")
            }
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

fn handle_phishing_check(req: PhishingCheckRequest) -> Response {
    let verdict = phishing::evaluate(&req.url, &req.saved_etld1, &req.exact_host);
    Response::success(json!(verdict))
}

fn parse<T: DeserializeOwned>(payload: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(payload)
        .map_err(|_| Response::failure_with(code::BAD_JSON, "invalid json"))
}

fn session_error_response(err: SessionError) -> Response {
    let code = match err {
        SessionError::NonceReplay => code::NONCE_REPLAY,
        SessionError::Expired => code::SESSION_EXPIRED,
        SessionError::InvalidState => code::INVALID_STATE,
        SessionError::Unauthorized => code::UNAUTHORIZED,
    };
    Response::failure(code)
}
