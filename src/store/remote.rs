//! Redis Store Module
//!
//! Backend that forwards every primitive to a Redis server.

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::{Client, Cmd, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use super::{Cursor, Expiration, KeyValueStore, ScanPage, TimeToLive};
use crate::config::{ClientOptions, Network};
use crate::error::{CacheError, Result};

// == Redis Store ==
/// Redis client holding one multiplexed, auto-reconnecting connection.
pub struct RedisStore {
    connection: Mutex<Option<ConnectionManager>>,
}

impl RedisStore {
    /// Connects to the server described by `options`.
    ///
    /// Sets the client name when one is configured.
    pub async fn connect(options: &ClientOptions) -> Result<Self> {
        let client = Client::open(connection_info(options)?)?;
        let mut connection = ConnectionManager::new(client).await?;

        if !options.client_name.is_empty() {
            redis::cmd("CLIENT")
                .arg("SETNAME")
                .arg(&options.client_name)
                .query_async::<()>(&mut connection)
                .await?;
        }

        Ok(Self {
            connection: Mutex::new(Some(connection)),
        })
    }

    fn connection(&self) -> Result<ConnectionManager> {
        self.connection
            .lock()
            .as_ref()
            .cloned()
            .ok_or(CacheError::Closed)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection()?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection()?;
        Ok(redis::cmd("GET").arg(key).query_async(&mut conn).await?)
    }

    async fn set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()> {
        expiration.validate()?;
        let mut conn = self.connection()?;
        set_command(key, value, expiration)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection()?;
        let removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    async fn scan(&self, cursor: Cursor, pattern: &str, count: u64) -> Result<ScanPage> {
        let mut conn = self.connection()?;
        let reply: redis::Value = scan_command(cursor, pattern, count)
            .query_async(&mut conn)
            .await?;
        parse_scan_reply(&reply)
    }

    async fn ttl(&self, key: &str) -> Result<TimeToLive> {
        let mut conn = self.connection()?;
        let reply: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        Ok(TimeToLive::from_millis_reply(reply))
    }

    fn close(&self) {
        // Dropping the last handle shuts the connection down
        self.connection.lock().take();
    }
}

// == Command Builders ==
/// Builds `SET key value [EX s | PX ms]`.
///
/// Whole-second durations use `EX`; anything finer uses `PX`, rounded up to
/// at least one millisecond.
fn set_command(key: &str, value: &[u8], expiration: Expiration) -> Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);

    if let Expiration::After(ttl) = expiration {
        if ttl.subsec_nanos() == 0 {
            cmd.arg("EX").arg(ttl.as_secs());
        } else {
            let millis = ttl.as_nanos().div_ceil(1_000_000).max(1);
            cmd.arg("PX").arg(millis as u64);
        }
    }

    cmd
}

/// Builds `SCAN cursor MATCH pattern [COUNT n]`; a count of 0 defers to the server.
fn scan_command(cursor: Cursor, pattern: &str, count: u64) -> Cmd {
    let mut cmd = redis::cmd("SCAN");
    cmd.arg(cursor.0).arg("MATCH").arg(pattern);
    if count > 0 {
        cmd.arg("COUNT").arg(count);
    }
    cmd
}

/// Decodes a `SCAN` reply.
///
/// Keys are taken as raw bytes and decoded one by one, so a single key that
/// is not UTF-8 does not fail the whole page.
fn parse_scan_reply(reply: &redis::Value) -> Result<ScanPage> {
    let (next, raw_keys): (u64, Vec<Vec<u8>>) = redis::from_redis_value(reply)?;
    Ok(ScanPage::from_raw(Cursor(next), raw_keys))
}

// == Connection Info ==
/// Translates client options into Redis connection parameters.
fn connection_info(options: &ClientOptions) -> Result<ConnectionInfo> {
    let addr = match options.network {
        Network::Tcp => tcp_addr(&options.addr)?,
        Network::Unix => unix_addr(&options.addr)?,
    };

    Ok(ConnectionInfo {
        addr,
        redis: RedisConnectionInfo {
            db: options.db,
            username: options.username.clone(),
            password: options.password.clone(),
            ..Default::default()
        },
    })
}

fn tcp_addr(addr: &str) -> Result<ConnectionAddr> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| CacheError::Config(format!("Address must be host:port, got {}", addr)))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| CacheError::Config(format!("Invalid port in address {}", addr)))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(CacheError::Config(format!("Missing host in address {}", addr)));
    }

    Ok(ConnectionAddr::Tcp(host.to_string(), port))
}

#[cfg(unix)]
fn unix_addr(path: &str) -> Result<ConnectionAddr> {
    if path.is_empty() {
        return Err(CacheError::Config("Missing unix socket path".to_string()));
    }
    Ok(ConnectionAddr::Unix(path.into()))
}

#[cfg(not(unix))]
fn unix_addr(_path: &str) -> Result<ConnectionAddr> {
    Err(CacheError::Config(
        "Unix sockets are not supported on this platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn packed(cmd: &Cmd) -> String {
        String::from_utf8_lossy(&cmd.get_packed_command()).into_owned()
    }

    #[test]
    fn test_tcp_connection_info() {
        let options = ClientOptions {
            addr: "cache.internal:6380".to_string(),
            db: 2,
            password: Some("secret".to_string()),
            ..ClientOptions::default()
        };

        let info = connection_info(&options).unwrap();
        assert_eq!(
            info.addr,
            ConnectionAddr::Tcp("cache.internal".to_string(), 6380)
        );
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("secret"));
        assert!(info.redis.username.is_none());
    }

    #[test]
    fn test_ipv6_address() {
        let addr = tcp_addr("[::1]:6379").unwrap();
        assert_eq!(addr, ConnectionAddr::Tcp("::1".to_string(), 6379));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(matches!(tcp_addr("localhost"), Err(CacheError::Config(_))));
        assert!(matches!(tcp_addr("localhost:http"), Err(CacheError::Config(_))));
        assert!(matches!(tcp_addr(":6379"), Err(CacheError::Config(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_connection_info() {
        let options = ClientOptions {
            network: Network::Unix,
            addr: "/var/run/redis.sock".to_string(),
            ..ClientOptions::default()
        };

        let info = connection_info(&options).unwrap();
        assert_eq!(info.addr, ConnectionAddr::Unix("/var/run/redis.sock".into()));
    }

    #[test]
    fn test_set_command_expiration_args() {
        let persist = packed(&set_command("k", b"v", Expiration::Never));
        assert!(!persist.contains("EX") && !persist.contains("PX"));

        let seconds = packed(&set_command(
            "k",
            b"v",
            Expiration::After(Duration::from_secs(10)),
        ));
        assert!(seconds.contains("$2\r\nEX\r\n$2\r\n10\r\n"));

        let millis = packed(&set_command(
            "k",
            b"v",
            Expiration::After(Duration::from_millis(1500)),
        ));
        assert!(millis.contains("$2\r\nPX\r\n$4\r\n1500\r\n"));

        let sub_milli = packed(&set_command(
            "k",
            b"v",
            Expiration::After(Duration::from_micros(10)),
        ));
        assert!(sub_milli.contains("$2\r\nPX\r\n$1\r\n1\r\n"));
    }

    #[test]
    fn test_scan_reply_with_non_utf8_key() {
        let reply = redis::Value::Array(vec![
            redis::Value::BulkString(b"0".to_vec()),
            redis::Value::Array(vec![
                redis::Value::BulkString(b"user:1".to_vec()),
                redis::Value::BulkString(b"user:\xff".to_vec()),
            ]),
        ]);

        let page = parse_scan_reply(&reply).unwrap();
        assert!(page.cursor.is_terminal());
        assert_eq!(page.keys, vec!["user:1".to_string()]);
        assert_eq!(page.undecodable, vec![b"user:\xff".to_vec()]);
    }

    #[test]
    fn test_scan_reply_resume_cursor() {
        let reply = redis::Value::Array(vec![
            redis::Value::BulkString(b"1536".to_vec()),
            redis::Value::Array(vec![]),
        ]);

        let page = parse_scan_reply(&reply).unwrap();
        assert_eq!(page.cursor, Cursor(1536));
        assert!(page.keys.is_empty());
    }

    #[test]
    fn test_scan_command_count() {
        let with_count = packed(&scan_command(Cursor(7), "user:*", 100));
        assert!(with_count.contains("$1\r\n7\r\n"));
        assert!(with_count.contains("MATCH\r\n$6\r\nuser:*\r\n"));
        assert!(with_count.contains("COUNT\r\n$3\r\n100\r\n"));

        let without_count = packed(&scan_command(Cursor::START, "*", 0));
        assert!(!without_count.contains("COUNT"));
    }
}
