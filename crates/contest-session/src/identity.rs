//! 身份解析：先登录，用户不存在时再注册。

use std::sync::Arc;

use arena_core::domain::{SessionIdentity, Username};
use tracing::{info, warn};

use crate::api::{AccountApi, LoginOutcome};
use crate::error::{Result, SessionError};
use crate::session::SessionContext;

pub struct IdentityResolver {
    api: Arc<dyn AccountApi>,
}

impl IdentityResolver {
    pub fn new(api: Arc<dyn AccountApi>) -> Self {
        Self { api }
    }

    /// 把用户名解析为稳定的用户身份。
    ///
    /// 登录返回“用户不存在”时改为注册，该中间结果不会暴露给调用方。
    /// 其余失败统一转换为 [`SessionError::IdentityResolution`]。
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, username: &str) -> Result<SessionIdentity> {
        let username = Username::new(username)?;
        let name = username.as_str();

        let outcome = self.api.login(name).await.map_err(|err| {
            warn!(username = name, error = %err, "login request failed");
            resolution_failed(name, err)
        })?;

        match outcome {
            LoginOutcome::Found(identity) => {
                info!(username = name, user_id = %identity.user_id(), "logged in");
                Ok(identity)
            }
            LoginOutcome::NotFound => {
                info!(username = name, "user not found, registering");
                let identity = self.api.register(name).await.map_err(|err| {
                    warn!(username = name, error = %err, "registration failed");
                    resolution_failed(name, err)
                })?;
                info!(username = name, user_id = %identity.user_id(), "registered");
                Ok(identity)
            }
        }
    }

    /// 解析身份并建立会话上下文。
    pub async fn establish(&self, username: &str) -> Result<SessionContext> {
        let identity = self.resolve(username).await?;
        Ok(SessionContext::new(identity))
    }
}

fn resolution_failed(username: &str, err: impl std::fmt::Display) -> SessionError {
    SessionError::IdentityResolution {
        username: username.to_string(),
        reason: err.to_string(),
    }
}
