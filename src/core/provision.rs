use crate::domain::model::{
    GroupRef, Host, HostGroup, HostInterface, Item, NewHost, NewItem, ProvisionReport,
    ProvisionedHost,
};
use crate::domain::ports::ApiTransport;
use crate::utils::error::{LoadGenError, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub const DEFAULT_GROUP_NAME: &str = "PerformanceTestGroup";
pub const DEFAULT_HOST_PREFIX: &str = "PerfTestHost";
pub const DEFAULT_KEY_PREFIX: &str = "perf.test";
pub const DEFAULT_AGENT_PORT: u16 = 10050;

/// What to create: names are derived from the prefixes and 1-based indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub group_name: String,
    pub host_prefix: String,
    pub key_prefix: String,
    pub host_count: usize,
    pub items_per_host: usize,
    pub server_address: String,
    pub agent_port: u16,
}

impl ProvisionPlan {
    pub fn new(server_address: impl Into<String>, host_count: usize, items_per_host: usize) -> Self {
        Self {
            group_name: DEFAULT_GROUP_NAME.to_string(),
            host_prefix: DEFAULT_HOST_PREFIX.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            host_count,
            items_per_host,
            server_address: server_address.into(),
            agent_port: DEFAULT_AGENT_PORT,
        }
    }

    pub fn host_name(&self, index: usize) -> String {
        format!("{}-{}", self.host_prefix, index)
    }

    pub fn item_key(&self, index: usize) -> String {
        format!("{}[{}]", self.key_prefix, index)
    }

    pub fn item_name(&self, index: usize) -> String {
        format!("PerfItem-{}", index)
    }
}

/// Get-then-create provisioning of one group, its hosts and their trapper
/// items. Stops at the first failed call; nothing already created is undone.
pub struct Provisioner<T: ApiTransport> {
    transport: T,
    plan: ProvisionPlan,
}

impl<T: ApiTransport> Provisioner<T> {
    pub fn new(transport: T, plan: ProvisionPlan) -> Self {
        Self { transport, plan }
    }

    pub fn plan(&self) -> &ProvisionPlan {
        &self.plan
    }

    pub async fn provision(&self) -> Result<ProvisionReport> {
        let (group_id, group_created) = self.ensure_group().await?;
        let mut report = ProvisionReport {
            group_id: group_id.clone(),
            group_created,
            ..ProvisionReport::default()
        };

        for i in 1..=self.plan.host_count {
            let name = self.plan.host_name(i);
            let (hostid, created) = self.ensure_host(&group_id, &name).await?;
            if created {
                report.hosts_created += 1;
            }

            let mut item_keys = Vec::with_capacity(self.plan.items_per_host);
            for j in 1..=self.plan.items_per_host {
                let key = self.plan.item_key(j);
                if self.ensure_item(&name, &hostid, j, &key).await? {
                    report.items_created += 1;
                }
                item_keys.push(key);
            }

            report.hosts.push(ProvisionedHost {
                name,
                hostid,
                item_keys,
            });
        }

        tracing::info!(
            "🏗️ Provisioning done: {} hosts ({} new), {} items ({} new)",
            report.hosts.len(),
            report.hosts_created,
            report.total_items(),
            report.items_created
        );
        Ok(report)
    }

    /// Returns the group id and whether it had to be created.
    pub async fn ensure_group(&self) -> Result<(String, bool)> {
        let name = &self.plan.group_name;
        let params = json!({
            "output": ["groupid", "name"],
            "filter": { "name": [name] },
        });
        let existing: Vec<HostGroup> = self.get("hostgroup.get", params).await?;

        if let Some(group) = existing.into_iter().next() {
            tracing::info!("📁 Group '{}' already exists, id {}", name, group.groupid);
            return Ok((group.groupid, false));
        }

        let result = self
            .transport
            .call("hostgroup.create", json!({ "name": name }))
            .await?;
        let groupid = first_id("hostgroup.create", &result, "groupids")?;
        tracing::info!("📁 Group '{}' created, id {}", name, groupid);
        Ok((groupid, true))
    }

    pub async fn ensure_host(&self, group_id: &str, name: &str) -> Result<(String, bool)> {
        let params = json!({
            "output": ["hostid", "host"],
            "filter": { "host": [name] },
        });
        let existing: Vec<Host> = self.get("host.get", params).await?;

        if let Some(host) = existing.into_iter().next() {
            tracing::info!("🖥️ Host '{}' already exists, id {}", name, host.hostid);
            return Ok((host.hostid, false));
        }

        let new_host = NewHost {
            host: name.to_string(),
            interfaces: vec![HostInterface::agent(
                &self.plan.server_address,
                self.plan.agent_port,
            )],
            groups: vec![GroupRef {
                groupid: group_id.to_string(),
            }],
        };
        let result = self
            .transport
            .call("host.create", serde_json::to_value(new_host)?)
            .await?;
        let hostid = first_id("host.create", &result, "hostids")?;
        tracing::info!("🖥️ Host '{}' created, id {}", name, hostid);
        Ok((hostid, true))
    }

    /// Returns true when the item was created.
    pub async fn ensure_item(&self, host_name: &str, hostid: &str, index: usize, key: &str) -> Result<bool> {
        let params = json!({
            "output": ["itemid", "key_", "hostid"],
            "hostids": [hostid],
            "filter": { "key_": [key] },
        });
        let existing: Vec<Item> = self.get("item.get", params).await?;

        if !existing.is_empty() {
            tracing::debug!("  Item '{}' already exists on '{}'", key, host_name);
            return Ok(false);
        }

        let item = NewItem::trapper(self.plan.item_name(index), key.to_string(), hostid.to_string());
        let result = self
            .transport
            .call("item.create", serde_json::to_value(item)?)
            .await?;
        first_id("item.create", &result, "itemids")?;
        tracing::debug!("  Item '{}' created on '{}'", key, host_name);
        Ok(true)
    }

    async fn get<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Vec<R>> {
        let result = self.transport.call(method, params).await?;
        serde_json::from_value(result).map_err(|e| LoadGenError::UnexpectedResponseError {
            method: method.to_string(),
            message: e.to_string(),
        })
    }
}

/// First identifier of a `*.create` response such as `{"hostids": ["10084"]}`.
fn first_id(method: &str, result: &Value, field: &str) -> Result<String> {
    result
        .get(field)
        .and_then(Value::as_array)
        .and_then(|ids| ids.first())
        .and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| LoadGenError::UnexpectedResponseError {
            method: method.to_string(),
            message: format!("missing '{}' in {}", field, result),
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeState {
        next_id: u64,
        groups: Vec<(String, String)>,
        hosts: Vec<(String, String, String)>,
        items: Vec<(String, String)>,
        calls: Vec<String>,
        fail_at_call: Option<usize>,
    }

    /// In-memory stand-in for the API that honors the filters provisioning uses.
    #[derive(Default)]
    pub(crate) struct FakeZabbix {
        state: Mutex<FakeState>,
    }

    impl FakeZabbix {
        pub(crate) fn with_group(name: &str, id: &str) -> Self {
            let fake = Self::default();
            fake.state
                .lock()
                .unwrap()
                .groups
                .push((id.to_string(), name.to_string()));
            fake
        }

        /// Makes the n-th call (1-based, counting from now) fail like a dropped connection.
        pub(crate) fn fail_at(&self, call: usize) {
            let mut state = self.state.lock().unwrap();
            state.fail_at_call = Some(state.calls.len() + call);
        }

        pub(crate) fn host_names(&self) -> Vec<String> {
            self.state.lock().unwrap().hosts.iter().map(|h| h.1.clone()).collect()
        }

        pub(crate) fn group_count(&self) -> usize {
            self.state.lock().unwrap().groups.len()
        }

        pub(crate) fn item_keys_for(&self, hostid: &str) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .items
                .iter()
                .filter(|(h, _)| h == hostid)
                .map(|(_, k)| k.clone())
                .collect()
        }

        pub(crate) fn item_count(&self) -> usize {
            self.state.lock().unwrap().items.len()
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }
    }

    fn filter_value<'a>(params: &'a Value, field: &str) -> Option<&'a str> {
        params["filter"][field][0].as_str()
    }

    #[async_trait]
    impl ApiTransport for FakeZabbix {
        async fn call(&self, method: &str, params: Value) -> Result<Value> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(method.to_string());
            if state.fail_at_call == Some(state.calls.len()) {
                return Err(LoadGenError::HttpStatusError {
                    status: 502,
                    body: "Bad Gateway".to_string(),
                });
            }

            state.next_id += 1;
            let new_id = (10000 + state.next_id).to_string();

            let result = match method {
                "hostgroup.get" => {
                    let name = filter_value(&params, "name").unwrap_or_default();
                    let found: Vec<Value> = state
                        .groups
                        .iter()
                        .filter(|(_, n)| n == name)
                        .map(|(id, n)| json!({"groupid": id, "name": n}))
                        .collect();
                    json!(found)
                }
                "hostgroup.create" => {
                    let name = params["name"].as_str().unwrap_or_default().to_string();
                    state.groups.push((new_id.clone(), name));
                    json!({"groupids": [new_id]})
                }
                "host.get" => {
                    let name = filter_value(&params, "host").unwrap_or_default();
                    let found: Vec<Value> = state
                        .hosts
                        .iter()
                        .filter(|(_, n, _)| n == name)
                        .map(|(id, n, _)| json!({"hostid": id, "host": n}))
                        .collect();
                    json!(found)
                }
                "host.create" => {
                    let name = params["host"].as_str().unwrap_or_default().to_string();
                    let group = params["groups"][0]["groupid"].as_str().unwrap_or_default().to_string();
                    state.hosts.push((new_id.clone(), name, group));
                    json!({"hostids": [new_id]})
                }
                "item.get" => {
                    let hostid = params["hostids"][0].as_str().unwrap_or_default();
                    let key = filter_value(&params, "key_").unwrap_or_default();
                    let found: Vec<Value> = state
                        .items
                        .iter()
                        .filter(|(h, k)| h == hostid && k == key)
                        .map(|(h, k)| json!({"itemid": "1", "key_": k, "hostid": h}))
                        .collect();
                    json!(found)
                }
                "item.create" => {
                    assert_eq!(params["type"], 2);
                    let hostid = params["hostid"].as_str().unwrap_or_default().to_string();
                    let key = params["key_"].as_str().unwrap_or_default().to_string();
                    state.items.push((hostid, key));
                    json!({"itemids": [new_id]})
                }
                other => panic!("unexpected method {}", other),
            };
            Ok(result)
        }
    }

    #[tokio::test]
    async fn test_provision_empty_state() {
        let fake = FakeZabbix::default();
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 2, 3));

        let report = provisioner.provision().await.unwrap();

        assert!(report.group_created);
        assert_eq!(report.hosts_created, 2);
        assert_eq!(report.items_created, 6);
        assert_eq!(fake.host_names(), vec!["PerfTestHost-1", "PerfTestHost-2"]);
        for host in &report.hosts {
            assert_eq!(
                fake.item_keys_for(&host.hostid),
                vec!["perf.test[1]", "perf.test[2]", "perf.test[3]"]
            );
            assert_eq!(host.item_keys.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_provision_twice_creates_no_duplicates() {
        let fake = FakeZabbix::default();
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 3, 2));

        let first = provisioner.provision().await.unwrap();
        let second = provisioner.provision().await.unwrap();

        assert_eq!(second.group_id, first.group_id);
        assert!(!second.group_created);
        assert_eq!(second.hosts_created, 0);
        assert_eq!(second.items_created, 0);
        assert_eq!(fake.group_count(), 1);
        assert_eq!(fake.host_names().len(), 3);
        assert_eq!(fake.item_count(), 6);
        assert_eq!(second.hosts, first.hosts);
    }

    #[tokio::test]
    async fn test_existing_group_is_reused() {
        let fake = FakeZabbix::with_group(DEFAULT_GROUP_NAME, "42");
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 4, 1));

        let report = provisioner.provision().await.unwrap();

        assert_eq!(report.group_id, "42");
        assert!(!report.group_created);
        assert_eq!(report.hosts_created, 4);
        assert_eq!(fake.group_count(), 1);
        assert!(!fake.calls().contains(&"hostgroup.create".to_string()));
    }

    #[tokio::test]
    async fn test_failure_stops_sequence() {
        let fake = FakeZabbix::default();
        // hostgroup.get, hostgroup.create, host.get, host.create, then 2 x (item.get, item.create),
        // then host.get for host 2 and the failing host.create.
        fake.fail_at(10);
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 3, 2));

        let err = provisioner.provision().await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(fake.host_names(), vec!["PerfTestHost-1"]);
        assert_eq!(fake.item_count(), 2);
        assert_eq!(fake.calls().len(), 10);
        assert_eq!(fake.calls().last().map(String::as_str), Some("host.create"));
    }

    #[tokio::test]
    async fn test_zero_items_per_host() {
        let fake = FakeZabbix::default();
        let provisioner = Provisioner::new(&fake, ProvisionPlan::new("127.0.0.1", 1, 0));

        let report = provisioner.provision().await.unwrap();

        assert_eq!(report.hosts.len(), 1);
        assert!(report.hosts[0].item_keys.is_empty());
        assert_eq!(fake.item_count(), 0);
    }

    #[test]
    fn test_first_id() {
        assert_eq!(
            first_id("host.create", &json!({"hostids": ["10084"]}), "hostids").unwrap(),
            "10084"
        );
        assert!(first_id("host.create", &json!({"hostids": []}), "hostids").is_err());
        assert!(first_id("host.create", &json!(true), "hostids").is_err());
    }

    #[test]
    fn test_plan_naming() {
        let plan = ProvisionPlan::new("10.0.0.1", 2, 3);
        assert_eq!(plan.host_name(2), "PerfTestHost-2");
        assert_eq!(plan.item_key(3), "perf.test[3]");
        assert_eq!(plan.item_name(1), "PerfItem-1");
        assert_eq!(plan.group_name, "PerformanceTestGroup");
    }
}
