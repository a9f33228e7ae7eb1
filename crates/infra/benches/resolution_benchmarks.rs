use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use permit_auth::{permission_enum, role_enum, QueryCache, QueryKind, TypeRegistry};
use permit_core::{Scope, Subject, SubjectId, SubjectType, TeamId, TeamType};
use permit_infra::{in_memory_authorizer, InMemoryAuthorizer, PermitConfig};

permission_enum! {
    pub enum ProjectPermission {
        Edit => "edit",
        Publish => "publish",
        Comment => "comment",
        Archive => "archive",
    }
}

role_enum! {
    pub enum ProjectRole: ProjectPermission {
        Editor => "editor" [Edit, Publish],
        Reviewer => "reviewer" [Comment],
        Owner => "owner" [Edit, Publish, Comment, Archive],
    }
}

permission_enum! {
    pub enum UserPermission {
        ManageUsers => "manage-users",
    }
}

role_enum! {
    pub enum UserRole: UserPermission {
        Admin => "admin" [ManageUsers],
    }
}

fn authorizer() -> InMemoryAuthorizer {
    in_memory_authorizer(
        &PermitConfig::default(),
        TypeRegistry::builder()
            .subject::<UserRole>(SubjectType::new("user"))
            .team::<ProjectRole>(TeamType::new("project")),
    )
    .expect("registry")
}

fn user() -> Subject {
    Subject::new(SubjectType::new("user"), SubjectId::new())
}

fn project() -> Scope {
    Scope::team(TeamType::new("project"), TeamId::new())
}

/// One subject holding Editor + Reviewer and a direct grant in `scopes` projects.
fn seeded(scopes: usize) -> (InMemoryAuthorizer, Subject, Vec<Scope>) {
    let authz = authorizer();
    let subject = user();
    let scopes: Vec<Scope> = (0..scopes).map(|_| project()).collect();
    for scope in &scopes {
        authz.assign_role(&subject, ProjectRole::Editor, scope, None).unwrap();
        authz.assign_role(&subject, ProjectRole::Reviewer, scope, None).unwrap();
        authz
            .assign_permission(&subject, ProjectPermission::Archive, scope, None)
            .unwrap();
    }
    (authz, subject, scopes)
}

fn bench_has_permission(c: &mut Criterion) {
    let mut group = c.benchmark_group("has_permission");
    group.throughput(Throughput::Elements(1));

    let (authz, subject, scopes) = seeded(1);
    let scope = &scopes[0];

    group.bench_function("cached", |b| {
        authz.has_permission(&subject, ProjectPermission::Publish, scope).unwrap();
        b.iter(|| {
            black_box(
                authz
                    .has_permission(&subject, black_box(ProjectPermission::Publish), scope)
                    .unwrap(),
            )
        });
    });

    group.bench_function("uncached", |b| {
        b.iter(|| {
            for kind in QueryKind::ROLE_MUTATION {
                let prefix = authz.cache_keys().group(&subject, scope, *kind);
                authz.cache().forget_group(&prefix).unwrap();
            }
            black_box(
                authz
                    .has_permission(&subject, black_box(ProjectPermission::Publish), scope)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

fn bench_store_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("permission_values_uncached");

    for scope_count in [1usize, 100, 1_000] {
        let (authz, subject, scopes) = seeded(scope_count);
        let scope = &scopes[scope_count / 2];

        group.bench_with_input(
            BenchmarkId::new("scopes_in_store", scope_count),
            &scope_count,
            |b, _| {
                b.iter(|| {
                    let prefix = authz.cache_keys().group(&subject, scope, QueryKind::Permissions);
                    authz.cache().forget_group(&prefix).unwrap();
                    let prefix = authz.cache_keys().group(&subject, scope, QueryKind::Roles);
                    authz.cache().forget_group(&prefix).unwrap();
                    black_box(authz.permission_values(&subject, scope).unwrap())
                });
            },
        );
    }

    group.finish();
}

fn bench_sync_roles(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutation");
    let (authz, subject, scopes) = seeded(10);
    let scope = &scopes[0];

    group.bench_function("sync_roles_and_requery", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let roles: &[ProjectRole] = if flip {
                &[ProjectRole::Owner]
            } else {
                &[ProjectRole::Editor, ProjectRole::Reviewer]
            };
            authz.sync_roles(&subject, roles, scope).unwrap();
            black_box(authz.has_permission(&subject, ProjectPermission::Archive, scope).unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_has_permission,
    bench_store_size,
    bench_sync_roles
);
criterion_main!(benches);
