#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]
use anyhow::Result;
use cql_mapper::SessionConfig;
use std::time::Duration;

/// CQL port exposed by the `ScyllaDB` image.
const CQL_PORT: u16 = 9042;

pub struct ClusterUnderTest {
    pub config: SessionConfig,
    #[allow(dead_code, clippy::type_complexity)]
    _cleanup: Option<Box<dyn FnOnce() + Send + Sync>>,
}

/// Bring up a single-node `ScyllaDB` container.
///
/// # Errors
/// Returns an error if the container fails to start or never accepts CQL connections.
pub async fn bring_up_scylla() -> Result<ClusterUnderTest> {
    use testcontainers::runners::AsyncRunner;
    use testcontainers_modules::scylladb::ScyllaDB;

    let container = ScyllaDB::default().start().await?;
    let port = container.get_host_port_ipv4(CQL_PORT).await?;
    wait_for_tcp("127.0.0.1", port, Duration::from_secs(90)).await?;

    let config = SessionConfig {
        contact_points: vec![format!("127.0.0.1:{port}")],
        connection_timeout: Duration::from_secs(30),
        ..SessionConfig::default()
    };

    Ok(ClusterUnderTest {
        config,
        _cleanup: Some(Box::new(move || drop(container))),
    })
}

async fn wait_for_tcp(host: &str, port: u16, timeout: Duration) -> Result<()> {
    use tokio::{
        net::TcpStream,
        time::{Instant, sleep},
    };
    let deadline = Instant::now() + timeout;
    loop {
        if TcpStream::connect((host, port)).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            anyhow::bail!("Timeout waiting for {host}:{port}");
        }
        sleep(Duration::from_millis(200)).await;
    }
}
