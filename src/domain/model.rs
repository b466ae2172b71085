use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroup {
    pub groupid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub hostid: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub itemid: String,
    pub key_: String,
    #[serde(default)]
    pub hostid: String,
}

/// Interface type codes used by `host.create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Agent = 1,
}

impl Serialize for InterfaceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInterface {
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    pub main: u8,
    pub useip: u8,
    pub ip: String,
    pub dns: String,
    pub port: String,
}

impl HostInterface {
    /// Main agent interface pointing at `address`. IP literals go in `ip`,
    /// anything else is treated as a DNS name.
    pub fn agent(address: &str, port: u16) -> Self {
        let is_ip = address.parse::<IpAddr>().is_ok();
        Self {
            kind: InterfaceKind::Agent,
            main: 1,
            useip: u8::from(is_ip),
            ip: if is_ip { address.to_string() } else { String::new() },
            dns: if is_ip { String::new() } else { address.to_string() },
            port: port.to_string(),
        }
    }
}

/// Collection method of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Trapper = 2,
}

impl Serialize for ItemType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Float = 0,
}

impl Serialize for ValueType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewHost {
    pub host: String,
    pub interfaces: Vec<HostInterface>,
    pub groups: Vec<GroupRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRef {
    pub groupid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
    pub name: String,
    pub key_: String,
    pub hostid: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub value_type: ValueType,
    pub delay: String,
}

impl NewItem {
    /// A float trapper item: no polling, waits for pushed values.
    pub fn trapper(name: String, key: String, hostid: String) -> Self {
        Self {
            name,
            key_: key,
            hostid,
            item_type: ItemType::Trapper,
            value_type: ValueType::Float,
            delay: "0".to_string(),
        }
    }
}

/// One row of a `history.push` request.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryValue {
    pub host: String,
    pub key: String,
    pub value: Value,
    pub clock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedHost {
    pub name: String,
    pub hostid: String,
    pub item_keys: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub group_id: String,
    pub group_created: bool,
    pub hosts: Vec<ProvisionedHost>,
    pub hosts_created: usize,
    pub items_created: usize,
}

impl ProvisionReport {
    pub fn total_items(&self) -> usize {
        self.hosts.iter().map(|h| h.item_keys.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLoadReport {
    pub host: String,
    pub sent: u64,
    pub failed: u64,
    pub elapsed: Duration,
    /// Set when the worker stopped early under the abort policy.
    pub aborted_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub hosts: Vec<HostLoadReport>,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn total_sent(&self) -> u64 {
        self.hosts.iter().map(|h| h.sent).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.hosts.iter().map(|h| h.failed).sum()
    }

    pub fn values_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_sent() as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub provision: ProvisionReport,
    pub load: Option<LoadReport>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_interface_ip_and_dns() {
        let by_ip = serde_json::to_value(HostInterface::agent("127.0.0.1", 10050)).unwrap();
        assert_eq!(
            by_ip,
            json!({"type": 1, "main": 1, "useip": 1, "ip": "127.0.0.1", "dns": "", "port": "10050"})
        );

        let by_dns = HostInterface::agent("zabbix.example.com", 10050);
        assert_eq!(by_dns.useip, 0);
        assert_eq!(by_dns.dns, "zabbix.example.com");
        assert!(by_dns.ip.is_empty());
    }

    #[test]
    fn test_trapper_item_codes() {
        let item = NewItem::trapper(
            "PerfItem-1".to_string(),
            "perf.test[1]".to_string(),
            "10084".to_string(),
        );
        let value = serde_json::to_value(item).unwrap();
        assert_eq!(value["type"], 2);
        assert_eq!(value["value_type"], 0);
        assert_eq!(value["delay"], "0");
        assert_eq!(value["key_"], "perf.test[1]");
    }

    #[test]
    fn test_load_report_totals() {
        let report = LoadReport {
            hosts: vec![
                HostLoadReport {
                    host: "a".to_string(),
                    sent: 10,
                    failed: 1,
                    elapsed: Duration::from_secs(1),
                    aborted_by: None,
                },
                HostLoadReport {
                    host: "b".to_string(),
                    sent: 30,
                    failed: 0,
                    elapsed: Duration::from_secs(1),
                    aborted_by: None,
                },
            ],
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(report.total_sent(), 40);
        assert_eq!(report.total_failed(), 1);
        assert!((report.values_per_second() - 20.0).abs() < f64::EPSILON);
    }
}
