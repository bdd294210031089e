//! Redis-backed keyspace source.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, FromRedisValue, IntoConnectionInfo};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::source::{Bytes, KeyspaceSource};

// == Redis Source ==
/// Single lazily-established connection to a Redis server.
///
/// A connection-class failure drops the connection; the next query
/// reconnects, so a dead server costs one failed poll per tick.
pub struct RedisSource {
    client: Client,
    conn: Option<MultiplexedConnection>,
}

impl RedisSource {
    /// Creates a source from configuration without connecting yet.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut info = (config.redis_host.as_str(), config.redis_port)
            .into_connection_info()
            .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
        info.redis.db = config.redis_db;
        info.redis.username = config.redis_username.clone();
        info.redis.password = config.redis_password.clone();

        let client = Client::open(info).map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
        Ok(Self { client, conn: None })
    }

    /// Opens the connection eagerly so startup can report reachability.
    pub async fn connect(&mut self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&mut self) -> Result<&mut MultiplexedConnection> {
        if self.conn.is_none() {
            let conn = self
                .client
                .get_multiplexed_tokio_connection()
                .await
                .map_err(|e| {
                    warn!("Redis connection failed: {}", e);
                    EngineError::NoConnection
                })?;
            info!("Connected to Redis at {:?}", self.client.get_connection_info().addr);
            self.conn = Some(conn);
        }
        self.conn.as_mut().ok_or(EngineError::NoConnection)
    }

    async fn query<T: FromRedisValue>(&mut self, cmd: redis::Cmd) -> Result<T> {
        let conn = self.connection().await?;
        match cmd.query_async::<_, T>(conn).await {
            Ok(value) => Ok(value),
            Err(err) => {
                let mapped = EngineError::from(err);
                if mapped == EngineError::NoConnection {
                    debug!("Dropping broken Redis connection");
                    self.conn = None;
                }
                Err(mapped)
            }
        }
    }
}

#[async_trait]
impl KeyspaceSource for RedisSource {
    async fn scan(&mut self, cursor: u64, count: usize) -> Result<(u64, Vec<Bytes>)> {
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(cursor).arg("COUNT").arg(count);
        self.query(cmd).await
    }

    async fn key_type(&mut self, key: &[u8]) -> Result<String> {
        let mut cmd = redis::cmd("TYPE");
        cmd.arg(key);
        self.query(cmd).await
    }

    async fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query(cmd).await
    }

    async fn llen(&mut self, key: &[u8]) -> Result<u64> {
        let mut cmd = redis::cmd("LLEN");
        cmd.arg(key);
        self.query(cmd).await
    }

    async fn lrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>> {
        let mut cmd = redis::cmd("LRANGE");
        cmd.arg(key).arg(start).arg(stop);
        self.query(cmd).await
    }

    async fn smembers(&mut self, key: &[u8]) -> Result<Vec<Bytes>> {
        let mut cmd = redis::cmd("SMEMBERS");
        cmd.arg(key);
        self.query(cmd).await
    }

    async fn zrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>> {
        let mut cmd = redis::cmd("ZRANGE");
        cmd.arg(key).arg(start).arg(stop);
        self.query(cmd).await
    }

    async fn hgetall(&mut self, key: &[u8]) -> Result<Vec<(Bytes, Bytes)>> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(key);
        self.query(cmd).await
    }

    async fn xlen(&mut self, key: &[u8]) -> Result<u64> {
        let mut cmd = redis::cmd("XLEN");
        cmd.arg(key);
        self.query(cmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_does_not_connect() {
        let config = Config {
            redis_port: 1,
            redis_db: 2,
            redis_password: Some("secret".to_string()),
            ..Config::default()
        };
        let source = RedisSource::from_config(&config).unwrap();
        assert!(source.conn.is_none());

        let info = source.client.get_connection_info();
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_no_connection() {
        // Port 1 on localhost is never a Redis server
        let config = Config {
            redis_port: 1,
            ..Config::default()
        };
        let mut source = RedisSource::from_config(&config).unwrap();
        let result = source.scan(0, 10).await;
        assert_eq!(result, Err(EngineError::NoConnection));
        assert!(source.conn.is_none());
    }
}
