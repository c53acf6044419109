//! Replica state
//!
//! Everything one peer knows: nodes, relations and accounts. Serializable so a
//! local replica can be persisted between runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use menagerie::{DomainError, Namespace, Node, RelationName, RelationSnapshot};

/// Stored account: key material guarded by a salted password digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub public_key: String,
    pub salt: String,
    pub digest: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replica {
    /// `None` marks a tombstoned node
    #[serde(default)]
    pub nodes: BTreeMap<String, Option<Node>>,
    /// namespace -> relation -> member souls, insertion ordered
    #[serde(default)]
    pub relations: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub accounts: BTreeMap<String, Account>,
}

/// Lookup result distinguishing "never seen" from "seen as deleted"
#[derive(Debug, Clone, PartialEq)]
pub enum NodeLookup {
    Unknown,
    Tombstone,
    Live(Node),
}

impl Replica {
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DomainError::StoreUnavailable(format!("failed to read replica {:?}: {}", path, e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            DomainError::StoreUnavailable(format!("failed to parse replica {:?}: {}", path, e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DomainError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                DomainError::StoreUnavailable(format!("failed to create {:?}: {}", dir, e))
            })?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::StoreUnavailable(format!("failed to encode replica: {}", e)))?;
        fs::write(path, content).map_err(|e| {
            DomainError::StoreUnavailable(format!("failed to write replica {:?}: {}", path, e))
        })
    }

    pub fn lookup(&self, soul: &str) -> NodeLookup {
        match self.nodes.get(soul) {
            None => NodeLookup::Unknown,
            Some(None) => NodeLookup::Tombstone,
            Some(Some(node)) => NodeLookup::Live(node.clone()),
        }
    }

    /// Merge fields into a node; a tombstone replaces it entirely
    pub fn apply_put(&mut self, soul: &str, node: Option<Node>) {
        match node {
            None => {
                self.nodes.insert(soul.to_string(), None);
            }
            Some(fields) => {
                let entry = self.nodes.entry(soul.to_string()).or_insert(None);
                match entry {
                    Some(existing) => existing.extend(fields),
                    None => *entry = Some(fields),
                }
            }
        }
    }

    pub fn apply_link(&mut self, namespace: &Namespace, relation: &RelationName, soul: &str) {
        let members = self
            .relations
            .entry(namespace.to_string())
            .or_default()
            .entry(relation.to_string())
            .or_default();
        if !members.iter().any(|m| m == soul) {
            members.push(soul.to_string());
        }
    }

    pub fn apply_unlink(&mut self, namespace: &Namespace, relation: &RelationName, soul: &str) {
        // Unlinking also creates the relation node, as clearing an edge does in the graph
        let members = self
            .relations
            .entry(namespace.to_string())
            .or_default()
            .entry(relation.to_string())
            .or_default();
        members.retain(|m| m != soul);
    }

    /// Claim an alias locally; `false` if it is already taken
    pub fn insert_account(&mut self, alias: &str, account: Account) -> bool {
        if self.accounts.contains_key(alias) {
            return false;
        }
        self.accounts.insert(alias.to_string(), account);
        true
    }

    /// Replicated account write. Competing claims on one alias keep the lowest public key.
    pub fn apply_account(&mut self, alias: &str, account: Account) {
        match self.accounts.get(alias) {
            Some(existing) if existing.public_key <= account.public_key => {}
            _ => {
                self.accounts.insert(alias.to_string(), account);
            }
        }
    }

    pub fn snapshot(&self, namespace: &Namespace, relation: &RelationName) -> RelationSnapshot {
        self.relations
            .get(namespace.as_str())
            .and_then(|relations| relations.get(relation.as_str()))
            .map(|members| RelationSnapshot::Members(members.clone()))
            .unwrap_or(RelationSnapshot::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Node {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_put_merges_fields() {
        let mut replica = Replica::default();
        replica.apply_put("pet_1", Some(fields(json!({"name": "Rex", "createdAt": "t0"}))));
        replica.apply_put("pet_1", Some(fields(json!({"name": "Max", "updatedAt": "t1"}))));

        let NodeLookup::Live(node) = replica.lookup("pet_1") else {
            panic!("expected live node");
        };
        assert_eq!(node["name"], "Max");
        assert_eq!(node["createdAt"], "t0");
        assert_eq!(node["updatedAt"], "t1");
    }

    fn account(public_key: &str) -> Account {
        Account {
            public_key: public_key.to_string(),
            salt: String::new(),
            digest: String::new(),
            secret: String::new(),
        }
    }

    #[test]
    fn test_competing_accounts_converge() {
        let mut left = Replica::default();
        let mut right = Replica::default();
        assert!(left.insert_account("alice", account("bbb")));
        assert!(right.insert_account("alice", account("aaa")));
        assert!(!left.insert_account("alice", account("ccc")));

        left.apply_account("alice", account("aaa"));
        right.apply_account("alice", account("bbb"));
        assert_eq!(left.accounts["alice"], right.accounts["alice"]);
        assert_eq!(left.accounts["alice"].public_key, "aaa");
    }

    #[test]
    fn test_tombstone_then_put_revives() {
        let mut replica = Replica::default();
        replica.apply_put("pet_1", None);
        assert_eq!(replica.lookup("pet_1"), NodeLookup::Tombstone);
        replica.apply_put("pet_1", Some(fields(json!({"name": "Rex"}))));
        assert!(matches!(replica.lookup("pet_1"), NodeLookup::Live(_)));
    }

    #[test]
    fn test_relation_absent_vs_empty() {
        let mut replica = Replica::default();
        let ns = Namespace::for_public_key("abc.def");
        let toolbox = RelationName::toolbox();
        assert_eq!(replica.snapshot(&ns, &toolbox), RelationSnapshot::Absent);

        replica.apply_link(&ns, &toolbox, "pet_1");
        replica.apply_link(&ns, &toolbox, "pet_1");
        assert_eq!(
            replica.snapshot(&ns, &toolbox),
            RelationSnapshot::Members(vec!["pet_1".to_string()])
        );

        replica.apply_unlink(&ns, &toolbox, "pet_1");
        assert_eq!(replica.snapshot(&ns, &toolbox), RelationSnapshot::Members(vec![]));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("replica.json");
        let mut replica = Replica::default();
        replica.apply_put("agent_1", Some(fields(json!({"name": "Scout"}))));
        replica.apply_link(&Namespace::for_public_key("k"), &RelationName::agents(), "agent_1");

        replica.save(&path).unwrap();
        assert_eq!(Replica::load(&path).unwrap(), replica);
    }
}
