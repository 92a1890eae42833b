use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use frostline_core::{ConnectorError, ConnectorResult};
use frostline_domain::{
    Access, AccessConsumer, AccessInfo, AccessProvider, Database, DataProduct, Grant, OutputPort,
    Role, ROLE_OVERRIDE_KEY, SchemaInfo, TableInfo, Team, TeamMember, ViewInfo, WarehouseUser,
};

use crate::catalog_ports::CatalogClient;
use crate::warehouse_ports::{RoleStore, UserDirectory, WarehouseCatalog};

use super::AccessReconciliationService;

#[derive(Default)]
struct FakeCatalogClient {
    accesses: HashMap<String, Access>,
    data_products: HashMap<String, DataProduct>,
    teams: HashMap<String, Team>,
}

#[async_trait]
impl CatalogClient for FakeCatalogClient {
    async fn get_access(&self, access_id: &str) -> ConnectorResult<Access> {
        self.accesses
            .get(access_id)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(format!("access '{access_id}' not found")))
    }

    async fn get_data_product(&self, data_product_id: &str) -> ConnectorResult<DataProduct> {
        self.data_products.get(data_product_id).cloned().ok_or_else(|| {
            ConnectorError::NotFound(format!("data product '{data_product_id}' not found"))
        })
    }

    async fn get_team(&self, team_id: &str) -> ConnectorResult<Team> {
        self.teams
            .get(team_id)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(format!("team '{team_id}' not found")))
    }
}

struct FakeWarehouse {
    schemas: Vec<SchemaInfo>,
    users: Vec<WarehouseUser>,
    roles: Mutex<HashMap<String, Role>>,
    role_grants: Mutex<HashSet<String>>,
    user_grants: Mutex<HashSet<String>>,
    deleted_roles: Mutex<Vec<String>>,
    list_user_calls: Mutex<usize>,
    calls: Mutex<usize>,
}

impl FakeWarehouse {
    fn new(schemas: Vec<SchemaInfo>, users: Vec<WarehouseUser>) -> Self {
        Self {
            schemas,
            users,
            roles: Mutex::default(),
            role_grants: Mutex::default(),
            user_grants: Mutex::default(),
            deleted_roles: Mutex::default(),
            list_user_calls: Mutex::default(),
            calls: Mutex::default(),
        }
    }

    async fn record_call(&self) {
        *self.calls.lock().await += 1;
    }

    async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }

    async fn role_grant_set(&self) -> HashSet<String> {
        self.role_grants.lock().await.clone()
    }
}

fn describe_grant(grant: &Grant) -> String {
    let target = match (&grant.securable, &grant.containing_scope) {
        (Some(securable), _) => securable.name.clone(),
        (None, Some(scope)) => format!(
            "{}.{}",
            scope.database,
            scope.schema.clone().unwrap_or_default()
        ),
        (None, None) => String::new(),
    };
    format!("{:?} {:?} {target}", grant.privileges, grant.securable_type)
}

#[async_trait]
impl RoleStore for FakeWarehouse {
    async fn find_role(&self, role_name: &str) -> ConnectorResult<Option<Role>> {
        self.record_call().await;
        Ok(self.roles.lock().await.get(role_name).cloned())
    }

    async fn create_role(&self, role: Role) -> ConnectorResult<()> {
        self.record_call().await;
        self.roles
            .lock()
            .await
            .entry(role.name.clone())
            .or_insert(role);
        Ok(())
    }

    async fn delete_role(&self, role_name: &str) -> ConnectorResult<()> {
        self.record_call().await;
        self.roles.lock().await.remove(role_name);
        self.deleted_roles.lock().await.push(role_name.to_owned());
        Ok(())
    }

    async fn grant_to_role(&self, role_name: &str, grant: Grant) -> ConnectorResult<()> {
        self.record_call().await;
        self.role_grants
            .lock()
            .await
            .insert(format!("{role_name} <- {}", describe_grant(&grant)));
        Ok(())
    }

    async fn grant_future_to_role(&self, role_name: &str, grant: Grant) -> ConnectorResult<()> {
        self.record_call().await;
        self.role_grants
            .lock()
            .await
            .insert(format!("{role_name} <- future {}", describe_grant(&grant)));
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for FakeWarehouse {
    async fn list_users(&self) -> ConnectorResult<Vec<WarehouseUser>> {
        self.record_call().await;
        *self.list_user_calls.lock().await += 1;
        Ok(self.users.clone())
    }

    async fn grant_role_to_user(&self, user_name: &str, role_name: &str) -> ConnectorResult<()> {
        self.record_call().await;
        self.user_grants
            .lock()
            .await
            .insert(format!("{user_name} <- {role_name}"));
        Ok(())
    }
}

#[async_trait]
impl WarehouseCatalog for FakeWarehouse {
    async fn list_databases(&self) -> ConnectorResult<Vec<Database>> {
        self.record_call().await;
        Ok(Vec::new())
    }

    async fn list_schemas(&self, _database: &str) -> ConnectorResult<Vec<SchemaInfo>> {
        self.record_call().await;
        Ok(self.schemas.clone())
    }

    async fn find_schema(
        &self,
        database: &str,
        schema: &str,
    ) -> ConnectorResult<Option<SchemaInfo>> {
        self.record_call().await;
        Ok(self
            .schemas
            .iter()
            .find(|candidate| candidate.database_name == database && candidate.name == schema)
            .cloned())
    }

    async fn list_tables(
        &self,
        _database: &str,
        _schema: &str,
    ) -> ConnectorResult<Vec<TableInfo>> {
        self.record_call().await;
        Ok(Vec::new())
    }

    async fn list_views(&self, _database: &str, _schema: &str) -> ConnectorResult<Vec<ViewInfo>> {
        self.record_call().await;
        Ok(Vec::new())
    }
}

fn schema(database: &str, name: &str) -> SchemaInfo {
    SchemaInfo {
        name: name.to_owned(),
        database_name: database.to_owned(),
        comment: None,
        created_on: None,
        dropped_on: None,
        kind: None,
        owner: None,
    }
}

fn user(name: &str, email: &str) -> WarehouseUser {
    WarehouseUser {
        name: name.to_owned(),
        email: Some(email.to_owned()),
    }
}

fn warehouse_output_port(id: &str) -> OutputPort {
    OutputPort {
        id: id.to_owned(),
        port_type: Some("warehouse".to_owned()),
        server: Some(HashMap::from([
            ("database".to_owned(), "SALES".to_owned()),
            ("schema".to_owned(), "PUBLIC".to_owned()),
        ])),
    }
}

fn provider_data_product() -> DataProduct {
    DataProduct {
        id: "dp-1".to_owned(),
        output_ports: vec![warehouse_output_port("op-1")],
        custom: HashMap::new(),
    }
}

fn access(id: &str, consumer: AccessConsumer) -> Access {
    Access {
        id: id.to_owned(),
        info: AccessInfo { active: Some(true) },
        provider: AccessProvider {
            data_product_id: "dp-1".to_owned(),
            output_port_id: "op-1".to_owned(),
        },
        consumer,
        custom: HashMap::new(),
    }
}

fn team_consumer() -> AccessConsumer {
    AccessConsumer {
        data_product_id: None,
        team_id: Some("team-9".to_owned()),
        user_id: None,
    }
}

fn team_of_two() -> Team {
    Team {
        id: "team-9".to_owned(),
        members: vec![
            TeamMember {
                name: Some("Alice".to_owned()),
                email_address: Some("Alice@Example.com".to_owned()),
            },
            TeamMember {
                name: Some("Bob".to_owned()),
                email_address: Some("bob@example.com".to_owned()),
            },
        ],
        custom: HashMap::new(),
    }
}

fn build_service(
    catalog: FakeCatalogClient,
    warehouse: Arc<FakeWarehouse>,
) -> AccessReconciliationService {
    AccessReconciliationService::new(
        Arc::new(catalog),
        warehouse.clone(),
        warehouse.clone(),
        warehouse,
    )
}

fn activation(access_id: &str) -> frostline_domain::AccessActivatedEvent {
    frostline_domain::AccessActivatedEvent {
        access_id: access_id.to_owned(),
    }
}

fn deactivation(access_id: &str) -> frostline_domain::AccessDeactivatedEvent {
    frostline_domain::AccessDeactivatedEvent {
        access_id: access_id.to_owned(),
    }
}

#[tokio::test]
async fn team_consumer_provisions_roles_members_and_grants() {
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::from([("team-9".to_owned(), team_of_two())]),
    };
    let warehouse = Arc::new(FakeWarehouse::new(
        vec![schema("SALES", "PUBLIC")],
        vec![
            user("ALICE", "alice@example.com"),
            user("BOB", "Bob@Example.com"),
            user("CAROL", "carol@example.com"),
        ],
    ));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(result.is_ok());

    let roles = warehouse.roles.lock().await;
    let access_role = roles.get("access_acc_42").cloned();
    assert_eq!(
        access_role.and_then(|role| role.comment),
        Some(
            "Managed access acc-42 to warehouse schema SALES.PUBLIC \
             for data product dp-1, output port op-1"
                .to_owned()
        )
    );
    let team_role = roles.get("team_team_9").cloned();
    assert_eq!(
        team_role.and_then(|role| role.comment),
        Some(super::MANAGED_ROLE_COMMENT.to_owned())
    );
    drop(roles);

    let user_grants = warehouse.user_grants.lock().await;
    assert!(user_grants.contains("ALICE <- team_team_9"));
    assert!(user_grants.contains("BOB <- team_team_9"));
    assert_eq!(user_grants.len(), 2);
    drop(user_grants);

    let role_grants = warehouse.role_grant_set().await;
    assert!(role_grants.contains("access_acc_42 <- [Usage] Role team_team_9"));
    assert!(role_grants.contains("access_acc_42 <- [Usage] Schema SALES.PUBLIC"));
    assert!(role_grants.contains("access_acc_42 <- [Select] Table SALES.PUBLIC"));
    assert!(role_grants.contains("access_acc_42 <- future [Select] Table SALES.PUBLIC"));
    assert!(role_grants.contains("access_acc_42 <- [Select] View SALES.PUBLIC"));
    assert!(role_grants.contains("access_acc_42 <- future [Select] View SALES.PUBLIC"));
    assert_eq!(role_grants.len(), 6);

    assert_eq!(*warehouse.list_user_calls.lock().await, 1);
}

#[tokio::test]
async fn reprocessing_an_activation_changes_nothing() {
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::from([("team-9".to_owned(), team_of_two())]),
    };
    let warehouse = Arc::new(FakeWarehouse::new(
        vec![schema("SALES", "PUBLIC")],
        vec![user("ALICE", "alice@example.com")],
    ));
    let service = build_service(catalog, warehouse.clone());

    assert!(
        service
            .handle_access_activated(&activation("acc-42"))
            .await
            .is_ok()
    );
    let roles_after_first = warehouse.roles.lock().await.clone();
    let grants_after_first = warehouse.role_grant_set().await;
    let user_grants_after_first = warehouse.user_grants.lock().await.clone();

    assert!(
        service
            .handle_access_activated(&activation("acc-42"))
            .await
            .is_ok()
    );
    assert_eq!(warehouse.roles.lock().await.clone(), roles_after_first);
    assert_eq!(warehouse.role_grant_set().await, grants_after_first);
    assert_eq!(
        warehouse.user_grants.lock().await.clone(),
        user_grants_after_first
    );
}

#[tokio::test]
async fn user_consumer_is_granted_the_access_role_directly() {
    let consumer = AccessConsumer {
        data_product_id: None,
        team_id: None,
        user_id: Some("Dora@Example.COM".to_owned()),
    };
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-7".to_owned(), access("acc-7", consumer))]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(
        vec![schema("SALES", "PUBLIC")],
        vec![user("DORA", "dora@example.com")],
    ));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-7")).await;
    assert!(result.is_ok());

    let user_grants = warehouse.user_grants.lock().await;
    assert!(user_grants.contains("DORA <- access_acc_7"));
    assert_eq!(user_grants.len(), 1);
}

#[tokio::test]
async fn data_product_consumer_provisions_product_and_owning_team() {
    let consumer = AccessConsumer {
        data_product_id: Some("dp-7".to_owned()),
        team_id: Some("team-9".to_owned()),
        user_id: None,
    };
    let consumer_product = DataProduct {
        id: "dp-7".to_owned(),
        output_ports: Vec::new(),
        custom: HashMap::new(),
    };
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-9".to_owned(), access("acc-9", consumer))]),
        data_products: HashMap::from([
            ("dp-1".to_owned(), provider_data_product()),
            ("dp-7".to_owned(), consumer_product),
        ]),
        teams: HashMap::from([("team-9".to_owned(), team_of_two())]),
    };
    let warehouse = Arc::new(FakeWarehouse::new(
        vec![schema("SALES", "PUBLIC")],
        vec![user("ALICE", "alice@example.com")],
    ));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-9")).await;
    assert!(result.is_ok());

    let roles = warehouse.roles.lock().await;
    assert!(roles.contains_key("access_acc_9"));
    assert!(roles.contains_key("dataproduct_dp_7"));
    assert!(roles.contains_key("team_team_9"));
    drop(roles);

    let role_grants = warehouse.role_grant_set().await;
    assert!(role_grants.contains("access_acc_9 <- [Usage] Role dataproduct_dp_7"));
    assert!(role_grants.contains("access_acc_9 <- [Usage] Role team_team_9"));
}

#[tokio::test]
async fn role_override_replaces_the_derived_access_role_name() {
    let mut overridden = access("acc-42", team_consumer());
    overridden
        .custom
        .insert(ROLE_OVERRIDE_KEY.to_owned(), "ANALYTICS_READER".to_owned());
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), overridden)]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::from([("team-9".to_owned(), team_of_two())]),
    };
    let warehouse = Arc::new(FakeWarehouse::new(vec![schema("SALES", "PUBLIC")], Vec::new()));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(result.is_ok());

    let roles = warehouse.roles.lock().await;
    assert!(roles.contains_key("ANALYTICS_READER"));
    assert!(!roles.contains_key("access_acc_42"));
}

#[tokio::test]
async fn non_warehouse_port_skips_without_warehouse_calls() {
    let data_product = DataProduct {
        id: "dp-1".to_owned(),
        output_ports: vec![OutputPort {
            id: "op-1".to_owned(),
            port_type: Some("object-storage".to_owned()),
            server: Some(HashMap::new()),
        }],
        custom: HashMap::new(),
    };
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), data_product)]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(Vec::new(), Vec::new()));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(result.is_ok());
    assert_eq!(warehouse.call_count().await, 0);
}

#[tokio::test]
async fn inactive_access_skips_without_warehouse_calls() {
    let mut inactive = access("acc-42", team_consumer());
    inactive.info.active = Some(false);
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), inactive)]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(Vec::new(), Vec::new()));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(result.is_ok());
    assert_eq!(warehouse.call_count().await, 0);
}

#[tokio::test]
async fn access_without_consumer_fails_before_any_warehouse_call() {
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([(
            "acc-42".to_owned(),
            access("acc-42", AccessConsumer::default()),
        )]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(vec![schema("SALES", "PUBLIC")], Vec::new()));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(matches!(result, Err(ConnectorError::Validation(_))));
    assert_eq!(warehouse.call_count().await, 0);
}

#[tokio::test]
async fn missing_output_port_is_a_not_found_error() {
    let data_product = DataProduct {
        id: "dp-1".to_owned(),
        output_ports: Vec::new(),
        custom: HashMap::new(),
    };
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), data_product)]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(Vec::new(), Vec::new()));
    let service = build_service(catalog, warehouse);

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(matches!(result, Err(ConnectorError::NotFound(_))));
}

#[tokio::test]
async fn blank_schema_server_field_is_a_validation_error() {
    let data_product = DataProduct {
        id: "dp-1".to_owned(),
        output_ports: vec![OutputPort {
            id: "op-1".to_owned(),
            port_type: Some("warehouse".to_owned()),
            server: Some(HashMap::from([
                ("database".to_owned(), "SALES".to_owned()),
                ("schema".to_owned(), "   ".to_owned()),
            ])),
        }],
        custom: HashMap::new(),
    };
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), data_product)]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(Vec::new(), Vec::new()));
    let service = build_service(catalog, warehouse);

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(matches!(result, Err(ConnectorError::Validation(_))));
}

#[tokio::test]
async fn missing_schema_in_warehouse_is_a_not_found_error() {
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(Vec::new(), Vec::new()));
    let service = build_service(catalog, warehouse);

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(matches!(result, Err(ConnectorError::NotFound(_))));
}

#[tokio::test]
async fn deactivation_deletes_the_access_role() {
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::from([("team-9".to_owned(), team_of_two())]),
    };
    let warehouse = Arc::new(FakeWarehouse::new(
        vec![schema("SALES", "PUBLIC")],
        vec![user("ALICE", "alice@example.com")],
    ));
    let service = build_service(catalog, warehouse.clone());

    assert!(
        service
            .handle_access_activated(&activation("acc-42"))
            .await
            .is_ok()
    );
    let result = service
        .handle_access_deactivated(&deactivation("acc-42"))
        .await;
    assert!(result.is_ok());

    assert!(!warehouse.roles.lock().await.contains_key("access_acc_42"));
    assert_eq!(
        warehouse.deleted_roles.lock().await.clone(),
        vec!["access_acc_42".to_owned()]
    );
    // Consumer roles outlive individual accesses.
    assert!(warehouse.roles.lock().await.contains_key("team_team_9"));
}

#[tokio::test]
async fn deactivating_a_never_provisioned_access_succeeds() {
    let mut inactive = access("acc-42", team_consumer());
    inactive.info.active = Some(false);
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), inactive)]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::new(),
    };
    let warehouse = Arc::new(FakeWarehouse::new(Vec::new(), Vec::new()));
    let service = build_service(catalog, warehouse.clone());

    let result = service
        .handle_access_deactivated(&deactivation("acc-42"))
        .await;
    assert!(result.is_ok());
    assert_eq!(
        warehouse.deleted_roles.lock().await.clone(),
        vec!["access_acc_42".to_owned()]
    );
}

#[tokio::test]
async fn team_members_without_warehouse_identity_are_skipped() {
    let team = Team {
        id: "team-9".to_owned(),
        members: vec![
            TeamMember {
                name: Some("Alice".to_owned()),
                email_address: Some("alice@example.com".to_owned()),
            },
            TeamMember {
                name: Some("Mallory".to_owned()),
                email_address: Some("mallory@elsewhere.example".to_owned()),
            },
        ],
        custom: HashMap::new(),
    };
    let catalog = FakeCatalogClient {
        accesses: HashMap::from([("acc-42".to_owned(), access("acc-42", team_consumer()))]),
        data_products: HashMap::from([("dp-1".to_owned(), provider_data_product())]),
        teams: HashMap::from([("team-9".to_owned(), team)]),
    };
    let warehouse = Arc::new(FakeWarehouse::new(
        vec![schema("SALES", "PUBLIC")],
        vec![user("ALICE", "alice@example.com")],
    ));
    let service = build_service(catalog, warehouse.clone());

    let result = service.handle_access_activated(&activation("acc-42")).await;
    assert!(result.is_ok());

    let user_grants = warehouse.user_grants.lock().await;
    assert_eq!(user_grants.len(), 1);
    assert!(user_grants.contains("ALICE <- team_team_9"));
}
