#![allow(dead_code)]

use monitor_core::http::{ApiClient, BasicAuth};
use secrecy::Secret;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use twofa_monitor::services::{MemberAuditor, MembersApi, MembersEndpoint, PAGE_SIZE};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WORKSPACE: &str = "acme";
pub const MEMBERS_PATH: &str = "/2.0/workspaces/acme/members";
/// `auditor:app-pass`, base64 encoded.
pub const AUTH_HEADER: &str = "Basic YXVkaXRvcjphcHAtcGFzcw==";

/// Members API client pointed at a wiremock server.
pub fn members_api(server: &MockServer) -> MembersApi {
    let client = ApiClient::new(
        BasicAuth::new("auditor", Secret::new("app-pass".to_string())),
        Duration::from_secs(10),
    )
    .expect("Failed to build API client");
    let endpoint = MembersEndpoint::new(&server.uri(), WORKSPACE).expect("Failed to build endpoint");

    MembersApi::new(client, endpoint)
}

pub fn auditor(server: &MockServer) -> MemberAuditor<MembersApi> {
    MemberAuditor::new(members_api(server))
}

pub fn user(name: &str, handle: &str, flag: Option<bool>) -> String {
    let flag = match flag {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    };
    format!(
        r#"{{"user":{{"display_name":"{name}","nickname":"{handle}","has_2fa_enabled":{flag}}}}}"#
    )
}

pub fn page_body(users: &[String], size: u32) -> String {
    format!(r#"{{"values":[{}],"size":{}}}"#, users.join(","), size)
}

/// A full page of enabled members, except indices listed in `disabled`.
pub fn full_page_body(prefix: &str, disabled: &[usize]) -> String {
    let users: Vec<String> = (0..PAGE_SIZE as usize)
        .map(|i| {
            let flag = if disabled.contains(&i) { Some(false) } else { Some(true) };
            user(&format!("{prefix} {i}"), &format!("{prefix}{i}"), flag)
        })
        .collect();
    page_body(&users, PAGE_SIZE)
}

/// Expect exactly one authenticated request for `page` and answer with `body`.
pub async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("page", page.to_string()))
        .and(query_param("per_page", PAGE_SIZE.to_string()))
        .and(header("authorization", AUTH_HEADER))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(body),
        )
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_error(server: &MockServer, page: u32, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(MEMBERS_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

/// In-memory sink for dry-run output.
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("utf-8 output")
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
