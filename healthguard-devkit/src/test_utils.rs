/*!
Test harness for HealthGuard clients

Starts the mock backend on an ephemeral local port and offers assertions on
the requests it received:
- call counts per endpoint (including "no request at all")
- fields of the last JSON body sent to an endpoint
*/

use crate::mock_backend::MockBackend;
use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct TestHarness {
    pub backend: MockBackend,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestHarness {
    /// Mock backend with one known user, `alice` / `secret123`
    pub async fn start() -> Result<Self> {
        Self::start_with(MockBackend::new().with_user("alice", "secret123")).await
    }

    pub async fn start_with(backend: MockBackend) -> Result<Self> {
        env_logger::try_init().ok();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = backend.router();
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("mock backend stopped: {}", e);
            }
        });
        log::info!("mock backend listening on {}", addr);

        Ok(Self {
            backend,
            addr,
            server,
        })
    }

    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn assert_called(&self, path: &str, expected: usize) -> Result<()> {
        let actual = self.backend.calls(path);
        if actual != expected {
            anyhow::bail!(
                "Expectation failed for '{}': expected {} calls, got {}",
                path,
                expected,
                actual
            );
        }
        Ok(())
    }

    pub fn assert_not_called(&self, path: &str) -> Result<()> {
        self.assert_called(path, 0)
    }

    pub fn assert_no_requests(&self) -> Result<()> {
        let total = self.backend.total_calls();
        if total != 0 {
            anyhow::bail!(
                "Expected no request, got {}: {:?}",
                total,
                self.backend.call_counts()
            );
        }
        Ok(())
    }

    /// `field_path` is dot separated (`form_data.bmi`).
    pub fn assert_field_equals(&self, path: &str, field_path: &str, expected: &Value) -> Result<()> {
        let Some(body) = self.backend.last_body(path) else {
            anyhow::bail!("No request body captured for {}", path);
        };
        match get_nested_field(&body, field_path) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!(
                "Field '{}' mismatch: expected {:?}, got {:?}",
                field_path,
                expected,
                actual
            ),
            None => anyhow::bail!("Field '{}' not found in last body sent to {}", field_path, path),
        }
    }

    pub fn stats(&self) -> TestStats {
        let path_counts = self.backend.call_counts();
        TestStats {
            total_calls: path_counts.values().sum(),
            path_counts,
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn get_nested_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(obj) => current = obj.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

#[derive(Debug)]
pub struct TestStats {
    pub total_calls: usize,
    pub path_counts: HashMap<String, usize>,
}

impl TestStats {
    pub fn print(&self) {
        println!("Mock backend statistics:");
        println!("  Total calls: {}", self.total_calls);
        for (path, count) in &self.path_counts {
            println!("    {}: {} calls", path, count);
        }
    }
}
