use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stockroom::core::iam::{
    require_owner_or_admin, scope_for, Action, PolicyEngine, Principal, Resource, Role,
};
use stockroom::core::ids::RecordId;

const RESOURCES: [Resource; 4] = [
    Resource::Supplier,
    Resource::Product,
    Resource::Inventory,
    Resource::Order,
];

const ACTIONS: [Action; 8] = [
    Action::List,
    Action::Read,
    Action::FindBy,
    Action::Create,
    Action::Update,
    Action::Patch,
    Action::Delete,
    Action::LowStock,
];

/// Benchmark full authorize() calls across the policy table
fn bench_authorize_table(c: &mut Criterion) {
    let engine = PolicyEngine::new();
    let admin = Principal::new(RecordId::new(), "root", Role::Admin);
    let user = Principal::new(RecordId::new(), "dana", Role::User);

    let mut group = c.benchmark_group("authorize_table");
    group.throughput(Throughput::Elements((RESOURCES.len() * ACTIONS.len()) as u64));

    for (name, principal) in [("admin", &admin), ("user", &user)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), principal, |b, principal| {
            b.iter(|| {
                for resource in RESOURCES {
                    for action in ACTIONS {
                        let decision = engine.authorize(Some(principal), resource, action);
                        black_box(decision.is_ok());
                    }
                }
            });
        });
    }

    group.finish();
}

/// Benchmark ownership comparison on canonical ids
fn bench_owner_check(c: &mut Criterion) {
    let user = Principal::new(RecordId::new(), "dana", Role::User);
    let own = user.id;
    let upper = user.id.to_string().to_uppercase();
    let foreign = RecordId::new();

    let mut group = c.benchmark_group("owner_check");

    group.bench_function("typed_match", |b| {
        b.iter(|| black_box(require_owner_or_admin(&user, &own).is_ok()));
    });

    group.bench_function("string_match_uppercase", |b| {
        b.iter(|| black_box(require_owner_or_admin(&user, &upper).is_ok()));
    });

    group.bench_function("mismatch", |b| {
        b.iter(|| black_box(require_owner_or_admin(&user, &foreign).is_err()));
    });

    group.finish();
}

/// Benchmark listing scopes for many principals
fn bench_scope_for(c: &mut Criterion) {
    let principal_counts = vec![100, 1_000, 10_000];

    let mut group = c.benchmark_group("scope_for");

    for count in principal_counts {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let principals: Vec<Principal> = (0..count)
                .map(|i| {
                    let role = if i % 10 == 0 { Role::Admin } else { Role::User };
                    Principal::new(RecordId::new(), format!("p{}", i), role)
                })
                .collect();

            b.iter(|| {
                for principal in &principals {
                    black_box(scope_for(principal, Resource::Order, Action::List));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_authorize_table,
    bench_owner_check,
    bench_scope_for
);
criterion_main!(benches);
