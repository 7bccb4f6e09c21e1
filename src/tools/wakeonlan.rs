use super::{EmitOptions, ToolContext};
use crate::{
    error::{AppError, Result},
    models::WakeOnLanResult,
    types::MacAddress,
    wol,
};

pub const DEFAULT_SOURCETYPE: &str = "wakeonlan";
pub const DEFAULT_SOURCE: &str = "wakeonlan_search_command";
pub const SUCCESS_MESSAGE: &str = "Wake-on-LAN request successfully sent";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WakeOnLanRequest {
    /// Name to look up in the host directory
    pub host: Option<String>,
    pub mac_address: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub emit: EmitOptions,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Wake a device, filling missing MAC/IP/port from the host directory
pub async fn wake_on_lan(ctx: &ToolContext, request: &WakeOnLanRequest) -> Result<WakeOnLanResult> {
    let meta = request.emit.meta(DEFAULT_SOURCETYPE, DEFAULT_SOURCE)?;

    let mut mac_address = non_blank(&request.mac_address);
    let mut ip_address = non_blank(&request.ip_address);
    let mut port = request.port;

    if let Some(host) = non_blank(&request.host) {
        let directory = ctx.hosts.as_ref().ok_or_else(|| {
            AppError::config("A host directory is required to resolve a host name (set a session key)")
        })?;

        if let Some(record) = directory.find_host(&host).await? {
            mac_address = mac_address.or(record.mac_address);
            ip_address = ip_address.or(record.ip_address);
            port = port.or(record.port);
        }
    }

    let mac: MacAddress = mac_address
        .ok_or_else(|| AppError::validation("No MAC address was provided and none could be found for the host"))?
        .parse()?;

    let target = wol::destination(ip_address.as_deref(), port)?;
    ctx.logger
        .info("Sending magic packet")
        .field("mac_address", mac.to_string())
        .field("target", target.to_string())
        .log()
        .await;

    wol::send_magic_packet(&mac, target).await?;

    let result = WakeOnLanResult {
        message: SUCCESS_MESSAGE.to_string(),
        mac_address: mac,
        ip_address,
        port,
    };

    if let Some(meta) = &meta {
        ctx.emit(meta, &result.to_event()).await?;
    }

    Ok(result)
}
