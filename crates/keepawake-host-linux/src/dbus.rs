//! D-Bus sleep inhibitor
//!
//! Talks to the `org.freedesktop.PowerManagement.Inhibit` interface, which is
//! served by xfce4-power-manager, gnome-power-manager and similar daemons.
//! Inhibitions are tied to the caller's bus connection: the power manager
//! drops them when the connection closes, so the connection has to stay open
//! until every inhibition was released.

use async_trait::async_trait;
use keepawake_host_api::{HostError, HostResult, InhibitorHandle, SleepInhibitor};
use tracing::{debug, info};
use zbus::{proxy, Connection};

#[proxy(
    interface = "org.freedesktop.PowerManagement.Inhibit",
    default_service = "org.freedesktop.PowerManagement",
    default_path = "/org/freedesktop/PowerManagement/Inhibit",
    gen_blocking = false
)]
trait PowerManagementInhibit {
    #[zbus(name = "Inhibit")]
    fn inhibit(&self, application: &str, reason: &str) -> zbus::Result<u32>;

    #[zbus(name = "UnInhibit")]
    fn un_inhibit(&self, cookie: u32) -> zbus::Result<()>;

    /// Only available with some power managers
    #[zbus(name = "GetInhibitors")]
    fn get_inhibitors(&self) -> zbus::Result<Vec<String>>;
}

/// Sleep inhibitor backed by the PowerManagement D-Bus service
pub struct DbusSleepInhibitor {
    proxy: PowerManagementInhibitProxy<'static>,
    reason: String,
}

impl DbusSleepInhibitor {
    /// Connect to the session bus
    pub async fn connect_session(reason: impl Into<String>) -> HostResult<Self> {
        let conn = Connection::session().await.map_err(connection_error)?;
        info!("Connected to session D-Bus");
        Self::from_connection(&conn, reason).await
    }

    /// Connect to the system bus
    pub async fn connect_system(reason: impl Into<String>) -> HostResult<Self> {
        let conn = Connection::system().await.map_err(connection_error)?;
        info!("Connected to system D-Bus");
        Self::from_connection(&conn, reason).await
    }

    /// Connect to an explicit bus address, e.g. `unix:path=/run/user/1000/bus`
    pub async fn connect_address(address: &str, reason: impl Into<String>) -> HostResult<Self> {
        let conn = zbus::connection::Builder::address(address)
            .map_err(connection_error)?
            .build()
            .await
            .map_err(connection_error)?;
        info!(address, "Connected to D-Bus");
        Self::from_connection(&conn, reason).await
    }

    /// Use an already established connection
    pub async fn from_connection(conn: &Connection, reason: impl Into<String>) -> HostResult<Self> {
        let proxy = PowerManagementInhibitProxy::new(conn)
            .await
            .map_err(connection_error)?;

        let reason = reason.into();
        debug!(reason = %reason, "PowerManagement inhibitor ready");

        Ok(Self { proxy, reason })
    }
}

#[async_trait]
impl SleepInhibitor for DbusSleepInhibitor {
    async fn inhibit(&self, name: &str) -> HostResult<InhibitorHandle> {
        debug!(application = name, reason = %self.reason, "Calling PowerManagement Inhibit");

        let cookie = self
            .proxy
            .inhibit(name, &self.reason)
            .await
            .map_err(call_error)?;

        debug!(application = name, cookie, "Inhibit returned cookie");
        Ok(InhibitorHandle::from_cookie(cookie))
    }

    async fn uninhibit(&self, handle: InhibitorHandle) -> HostResult<()> {
        debug!(cookie = handle.cookie(), "Calling PowerManagement UnInhibit");

        self.proxy
            .un_inhibit(handle.cookie())
            .await
            .map_err(call_error)
    }

    async fn active_inhibitors(&self) -> HostResult<Vec<String>> {
        let inhibitors = self.proxy.get_inhibitors().await.map_err(call_error)?;
        debug!(inhibitors = ?inhibitors, "Current inhibitors");
        Ok(inhibitors)
    }
}

fn connection_error(e: zbus::Error) -> HostError {
    HostError::Inhibition(format!("D-Bus connection failed: {}", e))
}

/// A method error is an answer from the power manager; anything else is
/// transport trouble.
fn call_error(e: zbus::Error) -> HostError {
    match e {
        zbus::Error::MethodError(name, detail, _) => HostError::Rejected(match detail {
            Some(detail) => format!("{}: {}", name, detail),
            None => name.to_string(),
        }),
        other => HostError::Inhibition(other.to_string()),
    }
}
