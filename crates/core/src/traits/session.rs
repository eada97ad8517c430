use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use tracing::warn;

use super::{CommandExecutor, RemoteSession};
use crate::ValidatorResult;

/// 远程会话的作用域守卫
///
/// 持有会话直到显式 `release` 或离开作用域，在任意退出路径上恰好关闭一次。
pub struct SessionGuard {
    session: Box<dyn RemoteSession>,
    released: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RemoteSession>) -> Self {
        Self {
            session,
            released: false,
        }
    }

    pub fn target(&self) -> &str {
        self.session.target()
    }

    /// 主动关闭会话并返回关闭结果
    pub fn release(mut self) -> ValidatorResult<()> {
        self.close_once()
    }

    fn close_once(&mut self) -> ValidatorResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.session.close()
    }
}

impl Deref for SessionGuard {
    type Target = dyn RemoteSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

#[async_trait]
impl CommandExecutor for SessionGuard {
    async fn execute(&self, command: &str) -> ValidatorResult<String> {
        self.session.execute(command).await
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let target = self.session.target().to_string();
        if let Err(e) = self.close_once() {
            warn!(target = %target, error = %e, "关闭远程会话失败");
        }
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("target", &self.session.target())
            .field("released", &self.released)
            .finish()
    }
}
