use async_trait::async_trait;
use redis::Script;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use parterre_core::lock::{LockError, LockHandle, LockProvider};

/// Delete the lock key only when it still carries our token, as one
/// server-side step. Prevents releasing a lock that expired and was
/// re-granted to another holder.
const RELEASE_IF_OWNER: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// How often acquisition re-attempts SET NX while waiting.
const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Distributed mutex over Redis: SET NX PX with a per-acquisition token
/// and a token-checked Lua release.
#[derive(Clone)]
pub struct RedisLockProvider {
    client: redis::Client,
    release_script: Script,
}

impl RedisLockProvider {
    pub fn connect(connection_string: &str) -> Result<Self, LockError> {
        let client = redis::Client::open(connection_string)
            .map_err(|e| LockError::Provider(e.to_string()))?;
        Ok(Self {
            client,
            release_script: Script::new(RELEASE_IF_OWNER),
        })
    }
}

#[async_trait]
impl LockProvider for RedisLockProvider {
    async fn acquire(
        &self,
        name: &str,
        wait: Duration,
        lease: Duration,
    ) -> Result<Option<LockHandle>, LockError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| LockError::Provider(e.to_string()))?;

        let token = Uuid::new_v4().to_string();
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            // SET NX: grants the lock only if nobody holds it; PX arms the
            // lease so a crashed holder cannot strand the seat forever.
            let granted: Option<String> = redis::cmd("SET")
                .arg(name)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(lease.as_millis() as u64)
                .query_async(&mut conn)
                .await
                .map_err(|e| LockError::Provider(e.to_string()))?;

            if granted.is_some() {
                debug!("Lock acquired: {}", name);
                return Ok(Some(LockHandle {
                    name: name.to_string(),
                    token,
                }));
            }

            if tokio::time::Instant::now() + RETRY_INTERVAL > deadline {
                debug!("Lock wait elapsed: {}", name);
                return Ok(None);
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    async fn release(&self, handle: LockHandle) -> Result<bool, LockError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| LockError::Provider(e.to_string()))?;

        let deleted: i64 = self
            .release_script
            .key(&handle.name)
            .arg(&handle.token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LockError::Provider(e.to_string()))?;

        Ok(deleted == 1)
    }
}
