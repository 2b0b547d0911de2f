//! # Stake-Sync Benchmarks
//!
//! | Subsystem | Path | Target |
//! |-----------|------|--------|
//! | ss-01 Amount Codec | encode / decode / format_fixed | < 5µs |
//! | ss-03 Contract Binding | selector + calldata encoding | < 10µs |
//! | ss-04 Staking Sync | connect + stake against in-memory contract | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shared_types::{Address, Amount, U256};
use ss_01_amount_codec::AmountCodec;
use ss_02_provider_session::MockWallet;
use ss_03_contract_binding::{CallArg, InMemoryStakingContract, MethodSet, GET_BALANCE, STAKE};
use ss_04_staking_sync::{StakingApi, StakingSynchronizer, SyncConfig};
use std::sync::Arc;

// ============================================================================
// SS-01: Amount Codec
// ============================================================================

fn bench_amount_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("ss-01-amount-codec");
    let codec = AmountCodec::default();

    for input in ["10", "0.000000000000000001", "123456789.123456789"] {
        group.bench_with_input(BenchmarkId::new("encode", input), &input, |b, input| {
            b.iter(|| black_box(codec.encode(input)))
        });
    }

    let amount = Amount::from_base_units(U256::exp10(30) + U256::from(7u8));
    group.bench_function("decode", |b| b.iter(|| black_box(codec.decode(amount))));
    group.bench_function("format_fixed", |b| {
        b.iter(|| black_box(codec.format_fixed(amount, 5)))
    });

    group.finish();
}

// ============================================================================
// SS-03: ABI Encoding
// ============================================================================

fn bench_abi_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("ss-03-contract-binding");
    let methods = MethodSet::staking();

    if let Some(get_balance) = methods.get(GET_BALANCE) {
        let args = [CallArg::from(Address::new("0xABC"))];
        group.bench_function("encode_get_balance", |b| {
            b.iter(|| black_box(get_balance.encode_call(&args)))
        });
    }

    if let Some(stake) = methods.get(STAKE) {
        group.bench_function("selector", |b| b.iter(|| black_box(stake.selector())));
    }

    group.finish();
}

// ============================================================================
// SS-04: Engine round trip
// ============================================================================

fn bench_stake_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ss-04-staking-sync");
    let Ok(runtime) = tokio::runtime::Runtime::new() else {
        return;
    };

    group.bench_function("connect_and_stake", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let config = SyncConfig::for_testing();
                let Ok(address) = config.contract() else {
                    return;
                };
                let contract = Arc::new(InMemoryStakingContract::new(address));
                let wallet = Arc::new(MockWallet::with_account("0xABC"));
                let Ok(engine) = StakingSynchronizer::new(Some(wallet), contract, config) else {
                    return;
                };
                let _ = engine.connect().await;
                black_box(engine.stake("1").await.is_ok());
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_amount_codec,
    bench_abi_encoding,
    bench_stake_round_trip
);
criterion_main!(benches);
