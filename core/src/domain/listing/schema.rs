use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    common::entities::app_errors::CoreError, listing::value_objects::SortSpec,
};

/// How a sort key's values compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortKind {
    /// Case-insensitive lexicographic.
    Text,
    /// Numeric; booleans read as 0/1, missing as 0.
    Number,
    /// Epoch milliseconds; missing or unparseable sorts first.
    Date,
    /// Length of an array, or a pre-counted number (`_count.users`).
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortKey {
    pub key: String,
    pub path: String,
    pub kind: SortKind,
}

/// Maps a filter name from the UI onto a record field, optionally
/// translating the selected value (`status=active` -> `isActive == true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterField {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl FilterField {
    pub fn resolve_value<'a>(&'a self, value: &'a str) -> &'a str {
        self.aliases
            .get(&value.trim().to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(value)
    }
}

/// Fields computed by the normalizer when a payload lacks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Derivation {
    FullName {
        target: String,
        first: String,
        last: String,
        fallbacks: Vec<String>,
    },
    StatusFromFlag {
        target: String,
        flag: String,
        active: String,
        inactive: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatRule {
    Total,
    FieldEquals { path: String, value: String },
    FieldIn { path: String, values: Vec<String> },
    Present { path: String },
    Absent { path: String },
    Sum { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatCard {
    pub name: String,
    pub rule: StatRule,
}

/// One column of the CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExportColumn {
    pub header: String,
    pub path: String,
}

/// Per-page configuration of the shared listing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListingSchema {
    pub name: String,
    pub normalizer_paths: Vec<String>,
    pub searchable: Vec<String>,
    pub filters: Vec<FilterField>,
    pub sort_keys: Vec<SortKey>,
    pub default_sort: Option<SortSpec>,
    pub date_field: String,
    pub derived: Vec<Derivation>,
    pub stat_cards: Vec<StatCard>,
    pub export_columns: Vec<ExportColumn>,
}

impl ListingSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normalizer_paths: Vec::new(),
            searchable: Vec::new(),
            filters: Vec::new(),
            sort_keys: Vec::new(),
            default_sort: None,
            date_field: "createdAt".to_string(),
            derived: Vec::new(),
            stat_cards: Vec::new(),
            export_columns: Vec::new(),
        }
    }

    pub fn normalizer_path(mut self, path: &str) -> Self {
        self.normalizer_paths.push(path.to_string());
        self
    }

    pub fn searchable(mut self, fields: &[&str]) -> Self {
        self.searchable
            .extend(fields.iter().map(|field| field.to_string()));
        self
    }

    pub fn filter(mut self, name: &str, path: &str) -> Self {
        self.filters.push(FilterField {
            name: name.to_string(),
            path: path.to_string(),
            aliases: BTreeMap::new(),
        });
        self
    }

    /// `active` / `inactive` filter over a boolean flag.
    pub fn flag_filter(mut self, name: &str, path: &str) -> Self {
        let aliases = BTreeMap::from([
            ("active".to_string(), "true".to_string()),
            ("inactive".to_string(), "false".to_string()),
        ]);
        self.filters.push(FilterField {
            name: name.to_string(),
            path: path.to_string(),
            aliases,
        });
        self
    }

    pub fn sort_key(mut self, key: &str, path: &str, kind: SortKind) -> Self {
        self.sort_keys.push(SortKey {
            key: key.to_string(),
            path: path.to_string(),
            kind,
        });
        self
    }

    pub fn sort_field(self, key: &str, kind: SortKind) -> Self {
        self.sort_key(key, key, kind)
    }

    pub fn default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = Some(sort);
        self
    }

    pub fn date_field(mut self, path: &str) -> Self {
        self.date_field = path.to_string();
        self
    }

    pub fn derive(mut self, derivation: Derivation) -> Self {
        self.derived.push(derivation);
        self
    }

    pub fn stat(mut self, name: &str, rule: StatRule) -> Self {
        self.stat_cards.push(StatCard {
            name: name.to_string(),
            rule,
        });
        self
    }

    pub fn column(mut self, header: &str, path: &str) -> Self {
        self.export_columns.push(ExportColumn {
            header: header.to_string(),
            path: path.to_string(),
        });
        self
    }

    pub fn resolve_sort_key(&self, key: &str) -> Option<&SortKey> {
        self.sort_keys.iter().find(|sort_key| sort_key.key == key)
    }

    pub fn filter_field(&self, name: &str) -> Option<&FilterField> {
        self.filters.iter().find(|field| field.name == name)
    }

    /// Sort used when the caller does not pick one.
    pub fn initial_sort(&self) -> Option<SortSpec> {
        self.default_sort.clone().or_else(|| {
            self.sort_keys
                .first()
                .map(|sort_key| SortSpec::asc(sort_key.key.clone()))
        })
    }
}

fn full_name(target: &str, first: &str, last: &str, fallbacks: &[&str]) -> Derivation {
    Derivation::FullName {
        target: target.to_string(),
        first: first.to_string(),
        last: last.to_string(),
        fallbacks: fallbacks.iter().map(|f| f.to_string()).collect(),
    }
}

fn active_status(flag: &str) -> Derivation {
    Derivation::StatusFromFlag {
        target: "status".to_string(),
        flag: flag.to_string(),
        active: "active".to_string(),
        inactive: "inactive".to_string(),
    }
}

fn equals(path: &str, value: &str) -> StatRule {
    StatRule::FieldEquals {
        path: path.to_string(),
        value: value.to_string(),
    }
}

fn sum(path: &str) -> StatRule {
    StatRule::Sum {
        path: path.to_string(),
    }
}

fn present(path: &str) -> StatRule {
    StatRule::Present {
        path: path.to_string(),
    }
}

fn absent(path: &str) -> StatRule {
    StatRule::Absent {
        path: path.to_string(),
    }
}

/// The back-office list pages served by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ListingKind {
    Branches,
    Users,
    Loans,
    BranchAssignments,
    Unions,
    UnionMembers,
}

impl ListingKind {
    pub const ALL: [ListingKind; 6] = [
        ListingKind::Branches,
        ListingKind::Users,
        ListingKind::Loans,
        ListingKind::BranchAssignments,
        ListingKind::Unions,
        ListingKind::UnionMembers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Branches => "branches",
            ListingKind::Users => "users",
            ListingKind::Loans => "loans",
            ListingKind::BranchAssignments => "branch-assignments",
            ListingKind::Unions => "unions",
            ListingKind::UnionMembers => "union-members",
        }
    }

    /// Backend collection the records are fetched from.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ListingKind::Branches => "/branches",
            ListingKind::Users | ListingKind::BranchAssignments => "/users",
            ListingKind::Loans => "/loans",
            ListingKind::Unions => "/unions",
            ListingKind::UnionMembers => "/union-members",
        }
    }

    pub fn schema(&self) -> ListingSchema {
        match self {
            ListingKind::Branches => branches_schema(),
            ListingKind::Users => users_schema(),
            ListingKind::Loans => loans_schema(),
            ListingKind::BranchAssignments => branch_assignments_schema(),
            ListingKind::Unions => unions_schema(),
            ListingKind::UnionMembers => union_members_schema(),
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::NotFound(format!("listing '{}'", s)))
    }
}

fn branches_schema() -> ListingSchema {
    ListingSchema::new("branches")
        .normalizer_path("data.branches")
        .searchable(&["name", "code", "manager.email"])
        .flag_filter("status", "isActive")
        .filter("manager", "managerId")
        .sort_field("name", SortKind::Text)
        .sort_field("code", SortKind::Text)
        .sort_key("manager", "manager.email", SortKind::Text)
        .sort_key("status", "isActive", SortKind::Number)
        .sort_key("users", "_count.users", SortKind::Count)
        .sort_key("customers", "_count.customers", SortKind::Count)
        .sort_key("loans", "_count.loans", SortKind::Count)
        .sort_field("createdAt", SortKind::Date)
        .default_sort(SortSpec::asc("name"))
        .stat("total", StatRule::Total)
        .stat("active", equals("isActive", "true"))
        .stat("with_manager", present("managerId"))
        .stat("users", sum("_count.users"))
        .stat("customers", sum("_count.customers"))
        .stat("loans", sum("_count.loans"))
        .column("Name", "name")
        .column("Code", "code")
        .column("Manager", "manager.email")
        .column("Active", "isActive")
        .column("Users", "_count.users")
        .column("Customers", "_count.customers")
        .column("Loans", "_count.loans")
        .column("Created At", "createdAt")
}

fn users_schema() -> ListingSchema {
    ListingSchema::new("users")
        .normalizer_path("data.users")
        .derive(full_name("name", "firstName", "lastName", &["email"]))
        .derive(active_status("isActive"))
        .searchable(&["name", "email", "role"])
        .filter("role", "role")
        .flag_filter("status", "isActive")
        .filter("supervisor", "supervisorId")
        .filter("branch", "branchId")
        .sort_field("name", SortKind::Text)
        .sort_field("email", SortKind::Text)
        .sort_field("role", SortKind::Text)
        .sort_key("status", "isActive", SortKind::Number)
        .sort_field("createdAt", SortKind::Date)
        .sort_field("lastLoginAt", SortKind::Date)
        .default_sort(SortSpec::asc("name"))
        .stat("total", StatRule::Total)
        .stat("active", equals("isActive", "true"))
        .stat("admins", equals("role", "ADMIN"))
        .stat("supervisors", equals("role", "SUPERVISOR"))
        .stat("credit_officers", equals("role", "CREDIT_OFFICER"))
        .column("Name", "name")
        .column("Email", "email")
        .column("Phone", "phone")
        .column("Role", "role")
        .column("Status", "status")
        .column("Created At", "createdAt")
}

fn loans_schema() -> ListingSchema {
    ListingSchema::new("loans")
        .normalizer_path("data.loans")
        .derive(full_name(
            "memberName",
            "unionMember.firstName",
            "unionMember.lastName",
            &[],
        ))
        .derive(full_name(
            "officerName",
            "createdByUser.firstName",
            "createdByUser.lastName",
            &["createdByUser.email"],
        ))
        .searchable(&[
            "loanNumber",
            "memberName",
            "loanType.name",
            "officerName",
            "createdByUser.email",
        ])
        .filter("status", "status")
        .filter("officer", "createdByUser.id")
        .filter("union", "unionId")
        .filter("loanType", "loanTypeId")
        .sort_field("loanNumber", SortKind::Text)
        .sort_key("member", "memberName", SortKind::Text)
        .sort_field("principalAmount", SortKind::Number)
        .sort_field("status", SortKind::Text)
        .sort_field("createdAt", SortKind::Date)
        .sort_field("startDate", SortKind::Date)
        .sort_field("endDate", SortKind::Date)
        .default_sort(SortSpec::desc("createdAt"))
        .stat("total", StatRule::Total)
        .stat(
            "active",
            StatRule::FieldIn {
                path: "status".to_string(),
                values: vec!["ACTIVE".to_string(), "APPROVED".to_string()],
            },
        )
        .stat("pending", equals("status", "PENDING_APPROVAL"))
        .stat("completed", equals("status", "COMPLETED"))
        .stat("principal", sum("principalAmount"))
        .column("Loan Number", "loanNumber")
        .column("Member", "memberName")
        .column("Union", "union.name")
        .column("Loan Type", "loanType.name")
        .column("Principal Amount", "principalAmount")
        .column("Processing Fee", "processingFeeAmount")
        .column("Status", "status")
        .column("Credit Officer", "officerName")
        .column("Start Date", "startDate")
        .column("End Date", "endDate")
}

fn branch_assignments_schema() -> ListingSchema {
    ListingSchema::new("branch-assignments")
        .normalizer_path("data.users")
        .derive(full_name("name", "firstName", "lastName", &["email"]))
        .searchable(&["name", "email", "role", "branch.name"])
        .filter("role", "role")
        .filter("branch", "branchId")
        .sort_field("name", SortKind::Text)
        .sort_field("email", SortKind::Text)
        .sort_field("role", SortKind::Text)
        .sort_key("branch", "branch.name", SortKind::Text)
        .sort_field("createdAt", SortKind::Date)
        .default_sort(SortSpec::asc("name"))
        .stat("total", StatRule::Total)
        .stat("admins", equals("role", "ADMIN"))
        .stat("branch_managers", equals("role", "SUPERVISOR"))
        .stat("credit_officers", equals("role", "CREDIT_OFFICER"))
        .stat("assigned", present("branchId"))
        .stat("unassigned", absent("branchId"))
        .column("Name", "name")
        .column("Email", "email")
        .column("Role", "role")
        .column("Branch", "branch.name")
}

fn unions_schema() -> ListingSchema {
    ListingSchema::new("unions")
        .normalizer_path("data.unions")
        .searchable(&["name", "location", "creditOfficer.email"])
        .flag_filter("status", "isActive")
        .filter("officer", "creditOfficerId")
        .sort_field("name", SortKind::Text)
        .sort_field("location", SortKind::Text)
        .sort_key("members", "_count.unionMembers", SortKind::Count)
        .sort_key("loans", "_count.loans", SortKind::Count)
        .sort_field("createdAt", SortKind::Date)
        .default_sort(SortSpec::asc("name"))
        .stat("total", StatRule::Total)
        .stat("active", equals("isActive", "true"))
        .stat("with_officer", present("creditOfficerId"))
        .stat("members", sum("_count.unionMembers"))
        .column("Name", "name")
        .column("Location", "location")
        .column("Credit Officer", "creditOfficer.email")
        .column("Members", "_count.unionMembers")
        .column("Loans", "_count.loans")
        .column("Created At", "createdAt")
}

fn union_members_schema() -> ListingSchema {
    ListingSchema::new("union-members")
        .normalizer_path("data.unionMembers")
        .derive(full_name("name", "firstName", "lastName", &["email"]))
        .searchable(&["name", "email", "phone", "code", "union.name"])
        .filter("verified", "isVerified")
        .filter("union", "unionId")
        .filter("officer", "currentOfficerId")
        .sort_field("name", SortKind::Text)
        .sort_field("email", SortKind::Text)
        .sort_key("union", "union.name", SortKind::Text)
        .sort_field("createdAt", SortKind::Date)
        .default_sort(SortSpec::desc("createdAt"))
        .stat("total", StatRule::Total)
        .stat("verified", equals("isVerified", "true"))
        .stat("assigned", present("currentOfficerId"))
        .stat("unassigned", absent("currentOfficerId"))
        .column("Name", "name")
        .column("Email", "email")
        .column("Phone", "phone")
        .column("Code", "code")
        .column("Union", "union.name")
        .column("Verified", "isVerified")
        .column("Created At", "createdAt")
}
