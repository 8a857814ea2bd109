//! Database role password rotation.
//!
//! The rotated secret holds the connection details of one database role.
//! Creating a credential asks the database platform to reset the role's
//! password; the platform applies the new password itself, so the set step
//! has nothing left to do. Testing opens a connection with the credential.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use rota_core::{ServiceClient, ServiceError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Connection details of a database role.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct RoleSecret {
    /// Role name.
    pub user: String,
    /// Role password.
    pub password: String,
    /// Endpoint host.
    pub host: String,
    /// Project owning the branch.
    pub project_id: String,
    /// Branch owning the role.
    pub branch_id: String,
    /// Database to connect to.
    #[serde(rename = "dbname")]
    pub database: String,
}

impl RoleSecret {
    /// Builds a libpq-style connection string with TLS verification.
    ///
    /// The password is omitted when empty.
    #[must_use]
    pub fn connection_string(&self) -> Zeroizing<String> {
        let mut conn = format!(
            "user={} dbname={} host={} sslmode=verify-full",
            self.user, self.database, self.host
        );
        if !self.password.is_empty() {
            conn.push_str(" password=");
            conn.push_str(&self.password);
        }
        Zeroizing::new(conn)
    }

    fn check_connectable(&self) -> Result<(), ServiceError> {
        let missing: Vec<&str> = [
            ("user", &self.user),
            ("host", &self.host),
            ("dbname", &self.database),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidSecret {
                reason: format!("cannot connect, missing {}", missing.join(", ")),
            })
        }
    }
}

impl fmt::Debug for RoleSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleSecret")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("project_id", &self.project_id)
            .field("branch_id", &self.branch_id)
            .field("database", &self.database)
            .finish()
    }
}

/// Platform API that resets role passwords.
pub trait PasswordResetter: Send + Sync {
    /// Resets the password of `role` and returns the new one.
    fn reset_role_password(
        &self,
        project_id: &str,
        branch_id: &str,
        role: &str,
    ) -> impl Future<Output = Result<Zeroizing<String>, ServiceError>> + Send;
}

/// Opens a connection and checks it responds.
pub trait ConnectionProber: Send + Sync {
    /// Connects with `connection_string` and pings the server.
    fn ping(&self, connection_string: &str) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

impl<T: PasswordResetter> PasswordResetter for Arc<T> {
    fn reset_role_password(
        &self,
        project_id: &str,
        branch_id: &str,
        role: &str,
    ) -> impl Future<Output = Result<Zeroizing<String>, ServiceError>> + Send {
        (**self).reset_role_password(project_id, branch_id, role)
    }
}

impl<T: ConnectionProber> ConnectionProber for Arc<T> {
    fn ping(&self, connection_string: &str) -> impl Future<Output = Result<(), ServiceError>> + Send {
        (**self).ping(connection_string)
    }
}

/// Service client rotating a database role password.
#[derive(Debug)]
pub struct RolePasswordClient<R, P> {
    resetter: R,
    prober: P,
}

impl<R: PasswordResetter, P: ConnectionProber> RolePasswordClient<R, P> {
    /// Creates a client.
    #[must_use]
    pub const fn new(resetter: R, prober: P) -> Self {
        Self { resetter, prober }
    }
}

impl<R: PasswordResetter, P: ConnectionProber> ServiceClient for RolePasswordClient<R, P> {
    type Secret = RoleSecret;

    async fn create(&self, secret: &mut RoleSecret) -> Result<(), ServiceError> {
        let password = self
            .resetter
            .reset_role_password(&secret.project_id, &secret.branch_id, &secret.user)
            .await?;
        if password.is_empty() {
            return Err(ServiceError::Rejected {
                reason: format!("password reset for role {} returned an empty password", secret.user),
            });
        }

        secret.password.zeroize();
        secret.password = password.as_str().to_string();
        info!(role = %secret.user, branch_id = %secret.branch_id, "reset role password");
        Ok(())
    }

    async fn set(
        &self,
        _current: &RoleSecret,
        _pending: &RoleSecret,
        _previous: Option<&RoleSecret>,
    ) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn test(&self, secret: &RoleSecret) -> Result<(), ServiceError> {
        secret.check_connectable()?;
        debug!(role = %secret.user, host = %secret.host, "probing connection");
        self.prober.ping(&secret.connection_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use test_case::test_case;

    #[derive(Default)]
    struct FakePlatform {
        resets: Mutex<Vec<(String, String, String)>>,
        pings: Mutex<Vec<String>>,
        refuse_ping: bool,
    }

    impl PasswordResetter for FakePlatform {
        async fn reset_role_password(
            &self,
            project_id: &str,
            branch_id: &str,
            role: &str,
        ) -> Result<Zeroizing<String>, ServiceError> {
            let mut resets = self.resets.lock();
            resets.push((project_id.to_string(), branch_id.to_string(), role.to_string()));
            Ok(Zeroizing::new(format!("reset-{}", resets.len())))
        }
    }

    impl ConnectionProber for FakePlatform {
        async fn ping(&self, connection_string: &str) -> Result<(), ServiceError> {
            self.pings.lock().push(connection_string.to_string());
            if self.refuse_ping {
                return Err(ServiceError::Rejected {
                    reason: "password authentication failed".to_string(),
                });
            }
            Ok(())
        }
    }

    fn secret() -> RoleSecret {
        RoleSecret {
            user: "app".to_string(),
            password: "old".to_string(),
            host: "ep-1.example.net".to_string(),
            project_id: "proj-1".to_string(),
            branch_id: "br-1".to_string(),
            database: "main".to_string(),
        }
    }

    #[test]
    fn connection_string_includes_password_when_set() {
        assert_eq!(
            secret().connection_string().as_str(),
            "user=app dbname=main host=ep-1.example.net sslmode=verify-full password=old"
        );

        let mut no_password = secret();
        no_password.password.clear();
        assert_eq!(
            no_password.connection_string().as_str(),
            "user=app dbname=main host=ep-1.example.net sslmode=verify-full"
        );
    }

    #[test]
    fn debug_redacts_password() {
        let debug = format!("{:?}", secret());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("old"));
    }

    #[test]
    fn serde_uses_dbname_field() {
        let json = serde_json::to_value(secret()).expect("serializes");
        assert_eq!(json["dbname"], "main");
        assert_eq!(json["project_id"], "proj-1");

        let parsed: RoleSecret = serde_json::from_value(json).expect("deserializes");
        assert_eq!(parsed, secret());
    }

    #[tokio::test]
    async fn create_resets_password_for_role() {
        let client = RolePasswordClient::new(FakePlatform::default(), FakePlatform::default());
        let mut role = secret();

        client.create(&mut role).await.expect("create succeeds");

        assert_eq!(role.password, "reset-1");
        assert_eq!(role.user, "app");
        assert_eq!(
            client.resetter.resets.lock().clone(),
            vec![("proj-1".to_string(), "br-1".to_string(), "app".to_string())]
        );
    }

    #[tokio::test]
    async fn set_is_a_no_op() {
        let client = RolePasswordClient::new(FakePlatform::default(), FakePlatform::default());
        client
            .set(&secret(), &secret(), None)
            .await
            .expect("set succeeds");
        assert!(client.resetter.resets.lock().is_empty());
        assert!(client.prober.pings.lock().is_empty());
    }

    #[tokio::test]
    async fn test_pings_with_connection_string() {
        let client = RolePasswordClient::new(FakePlatform::default(), FakePlatform::default());
        client.test(&secret()).await.expect("ping succeeds");

        let pings = client.prober.pings.lock().clone();
        assert_eq!(pings.len(), 1);
        assert!(pings[0].ends_with("password=old"));
    }

    #[tokio::test]
    async fn test_surfaces_ping_failure() {
        let prober = FakePlatform {
            refuse_ping: true,
            ..FakePlatform::default()
        };
        let client = RolePasswordClient::new(FakePlatform::default(), prober);

        let err = client.test(&secret()).await.expect_err("ping refused");
        assert!(matches!(err, ServiceError::Rejected { .. }));
    }

    #[test_case("user")]
    #[test_case("host")]
    #[test_case("dbname")]
    #[tokio::test]
    async fn test_requires_connection_fields(field: &str) {
        let client = RolePasswordClient::new(FakePlatform::default(), FakePlatform::default());
        let mut role = secret();
        match field {
            "user" => role.user.clear(),
            "host" => role.host.clear(),
            _ => role.database.clear(),
        }

        let err = client.test(&role).await.expect_err("not connectable");
        assert!(matches!(err, ServiceError::InvalidSecret { ref reason } if reason.contains(field)));
        assert!(client.prober.pings.lock().is_empty());
    }
}
