//! Static service catalog — the four utility services, their bilingual
//! display names, and the provider list the chatbot offers per service.
//!
//! Read-only at runtime. The richer supplier directory (portal URLs,
//! automation flags) lives in [`SupplierDirectory`] and is loaded from an
//! embedded JSON seed.

use serde::{Deserialize, Serialize};

// ─── ServiceKind ──────────────────────────────────────────────────────────────

/// The utility service categories the portal handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Gas,
    Electricity,
    Water,
    Property,
}

impl ServiceKind {
    /// All kinds in catalog order.
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Gas,
        ServiceKind::Electricity,
        ServiceKind::Water,
        ServiceKind::Property,
    ];

    /// Canonical key stored in SQL and used in button payloads / URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Gas => "gas",
            ServiceKind::Electricity => "electricity",
            ServiceKind::Water => "water",
            ServiceKind::Property => "property",
        }
    }

    pub fn parse(s: &str) -> Option<ServiceKind> {
        match s {
            "gas" => Some(ServiceKind::Gas),
            "electricity" => Some(ServiceKind::Electricity),
            "water" => Some(ServiceKind::Water),
            "property" => Some(ServiceKind::Property),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── ServiceCatalog ───────────────────────────────────────────────────────────

/// One service with its display names and ordered provider list.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEntry {
    pub kind: ServiceKind,
    pub name: String,
    /// Hindi display name shown alongside the English one in menus.
    pub name_local: String,
    pub providers: Vec<String>,
}

/// Ordered catalog of services. Iteration order is the catalog's defined
/// order and is the tie-break for ambiguous free-text matches.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    entries: Vec<ServiceEntry>,
}

impl ServiceCatalog {
    /// The built-in portal catalog.
    pub fn default_catalog() -> Self {
        fn entry(kind: ServiceKind, name: &str, local: &str, providers: &[&str]) -> ServiceEntry {
            ServiceEntry {
                kind,
                name: name.to_string(),
                name_local: local.to_string(),
                providers: providers.iter().map(|p| p.to_string()).collect(),
            }
        }
        Self {
            entries: vec![
                entry(
                    ServiceKind::Gas,
                    "Gas",
                    "गैस",
                    &["Gujarat Gas", "HP Gas", "Indane"],
                ),
                entry(
                    ServiceKind::Electricity,
                    "Electricity",
                    "बिजली",
                    &["GUVNL", "DGVCL", "UGVCL"],
                ),
                entry(
                    ServiceKind::Water,
                    "Water",
                    "पानी",
                    &["Water Board", "Municipal Corp"],
                ),
                entry(
                    ServiceKind::Property,
                    "Property",
                    "संपत्ति",
                    &["Land Records", "Municipal"],
                ),
            ],
        }
    }

    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn get(&self, kind: ServiceKind) -> Option<&ServiceEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Service keys in catalog order, as reported by the status probe.
    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.kind.as_str()).collect()
    }

    /// Canonical provider name for `kind`, matched case-insensitively.
    pub fn canonical_provider(&self, kind: ServiceKind, name: &str) -> Option<&str> {
        self.get(kind)?
            .providers
            .iter()
            .find(|p| p.eq_ignore_ascii_case(name))
            .map(|p| p.as_str())
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}

// ─── SupplierDirectory ────────────────────────────────────────────────────────

/// One supplier record from the embedded directory seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_local: Option<String>,
    #[serde(default)]
    pub portal_url: Option<String>,
    /// Supplier exposes an online self-service portal.
    #[serde(default)]
    pub online_available: bool,
    /// Portal supports the stub automation endpoints.
    #[serde(default)]
    pub automation_enabled: bool,
}

/// Per-category supplier directory (portal URLs, capability flags).
///
/// Loaded once at startup from the embedded `data/suppliers.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplierDirectory {
    gas: Vec<Supplier>,
    electricity: Vec<Supplier>,
    water: Vec<Supplier>,
    property: Vec<Supplier>,
}

impl SupplierDirectory {
    /// Parse the embedded supplier seed.
    pub fn embedded() -> anyhow::Result<Self> {
        let raw = include_str!("../../data/suppliers.json");
        Ok(serde_json::from_str(raw)?)
    }

    pub fn category(&self, kind: ServiceKind) -> &[Supplier] {
        match kind {
            ServiceKind::Gas => &self.gas,
            ServiceKind::Electricity => &self.electricity,
            ServiceKind::Water => &self.water,
            ServiceKind::Property => &self.property,
        }
    }

    /// Look a supplier up by id across every category.
    pub fn find(&self, supplier_id: &str) -> Option<(ServiceKind, &Supplier)> {
        ServiceKind::ALL.iter().find_map(|kind| {
            self.category(*kind)
                .iter()
                .find(|s| s.id == supplier_id)
                .map(|s| (*kind, s))
        })
    }

    /// Case-insensitive name search across every category.
    pub fn search(&self, query: &str) -> Vec<(ServiceKind, &Supplier)> {
        let needle = query.to_lowercase();
        ServiceKind::ALL
            .iter()
            .flat_map(|kind| {
                self.category(*kind)
                    .iter()
                    .filter(|s| s.name.to_lowercase().contains(&needle))
                    .map(move |s| (*kind, s))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_is_stable() {
        let catalog = ServiceCatalog::default_catalog();
        let keys = catalog.keys();
        assert_eq!(keys, vec!["gas", "electricity", "water", "property"]);
    }

    #[test]
    fn canonical_provider_is_case_insensitive() {
        let catalog = ServiceCatalog::default_catalog();
        assert_eq!(
            catalog.canonical_provider(ServiceKind::Electricity, "guvnl"),
            Some("GUVNL")
        );
        assert_eq!(
            catalog.canonical_provider(ServiceKind::Electricity, "Tata Power"),
            None
        );
    }

    #[test]
    fn embedded_directory_parses_and_indexes() {
        let dir = SupplierDirectory::embedded().unwrap();
        assert!(!dir.category(ServiceKind::Gas).is_empty());
        let (kind, supplier) = dir.find("gujarat-gas").unwrap();
        assert_eq!(kind, ServiceKind::Gas);
        assert_eq!(supplier.name, "Gujarat Gas");
        assert!(!dir.search("gas").is_empty());
    }
}
