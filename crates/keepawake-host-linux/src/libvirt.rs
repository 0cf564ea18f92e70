//! Libvirt workload observer
//!
//! Lists active domains through `virsh` rather than linking libvirt:
//! - `virsh list --uuid` for the active set (one UUID per line)
//! - `virsh domname <uuid>` to resolve each domain's name
//!
//! A domain can shut down between the two calls, which is why name
//! resolution is fallible per domain.

use async_trait::async_trait;
use keepawake_host_api::{HostError, HostResult, Workload, WorkloadObserver};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// How to invoke `virsh` against one libvirt connection
#[derive(Debug)]
struct Virsh {
    program: PathBuf,
    uri: String,
    timeout: Duration,
}

impl Virsh {
    /// Run `virsh -c <uri> --readonly <args>` and return stdout.
    ///
    /// Non-zero exit status is turned into an error with `on_failure`; the
    /// child is killed if it outlives the timeout.
    async fn run(&self, args: &[&str], on_failure: fn(String) -> HostError) -> HostResult<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c")
            .arg(&self.uri)
            .arg("--readonly")
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), uri = %self.uri, args = ?args, "Running virsh");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| HostError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(on_failure(format!(
                "virsh {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| on_failure(format!("virsh {} produced non UTF-8 output", args.join(" "))))
    }
}

/// Observer for active libvirt domains
pub struct LibvirtObserver {
    virsh: Arc<Virsh>,
}

impl LibvirtObserver {
    pub fn new(uri: impl Into<String>, virsh_path: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            virsh: Arc::new(Virsh {
                program: virsh_path.as_ref().to_path_buf(),
                uri: uri.into(),
                timeout,
            }),
        }
    }

    pub fn uri(&self) -> &str {
        &self.virsh.uri
    }
}

#[async_trait]
impl WorkloadObserver for LibvirtObserver {
    async fn list_active(&self) -> HostResult<Vec<Box<dyn Workload>>> {
        let stdout = self.virsh.run(&["list", "--uuid"], HostError::Observer).await?;
        let uuids = parse_uuid_list(&stdout);

        debug!(count = uuids.len(), uuids = ?uuids, "Listed active domains");

        Ok(uuids
            .into_iter()
            .map(|uuid| {
                Box::new(LibvirtDomain {
                    uuid,
                    virsh: self.virsh.clone(),
                }) as Box<dyn Workload>
            })
            .collect())
    }
}

/// An active libvirt domain, identified by UUID
#[derive(Debug)]
pub struct LibvirtDomain {
    uuid: String,
    virsh: Arc<Virsh>,
}

#[async_trait]
impl Workload for LibvirtDomain {
    async fn name(&self) -> HostResult<String> {
        let stdout = self
            .virsh
            .run(&["domname", self.uuid.as_str()], HostError::NameUnavailable)
            .await?;

        let name = stdout.trim();
        if name.is_empty() {
            return Err(HostError::NameUnavailable(format!(
                "virsh returned an empty name for domain {}",
                self.uuid
            )));
        }
        Ok(name.to_string())
    }
}

/// Parse `virsh list --uuid` output: one UUID per line, blank lines ignored
pub fn parse_uuid_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
