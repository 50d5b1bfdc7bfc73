// ==========================================
// Repository 集成测试
// ==========================================
// 测试范围: 基于文件数据库的 HeatRepository / ProductionRepository
// 1. 批量写入剩余量的原子性
// 2. 缺失炉号的处理策略
// 3. 生产记录读写与汇总
// ==========================================


use chrono::{NaiveDate, Utc};
use heat_inventory::domain::{NewHeat, Production, SteelType};
use heat_inventory::repository::{
    HeatRepository, MissingHeatPolicy, ProductionRepository, RemainingUpdate, RepositoryError,
};
use test_helpers::{create_test_db, open_shared_connection};

fn new_heat(number: &str, quantity_kg: f64, day: u32) -> NewHeat {
    NewHeat {
        heat_number: number.to_string(),
        steel_type: SteelType::new("23mm"),
        quantity_kg,
        date_received: NaiveDate::from_ymd_opt(2024, 3, day),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
}

#[test]
fn test_commit_remaining_过期值整批回滚() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = HeatRepository::new(&db_path).unwrap();

    let h1 = repo.insert(&new_heat("H1", 100.0, 1).into_heat(today())).unwrap();
    let h2 = repo.insert(&new_heat("H2", 100.0, 2).into_heat(today())).unwrap();

    let updates = vec![
        RemainingUpdate {
            heat_id: h1.heat_id.clone(),
            expected_remaining_kg: 100.0,
            new_remaining_kg: 0.0,
        },
        RemainingUpdate {
            heat_id: h2.heat_id.clone(),
            // 实际为 100,模拟并发修改
            expected_remaining_kg: 90.0,
            new_remaining_kg: 40.0,
        },
    ];
    let result = repo.commit_remaining(&updates, MissingHeatPolicy::Fail);
    assert!(matches!(result, Err(RepositoryError::StaleHeatState { .. })));

    // 第一条也必须回滚
    assert_eq!(repo.find_by_id(&h1.heat_id).unwrap().unwrap().remaining_kg, 100.0);
    assert_eq!(repo.find_by_id(&h2.heat_id).unwrap().unwrap().remaining_kg, 100.0);
}

#[test]
fn test_commit_remaining_缺失炉号策略() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = HeatRepository::new(&db_path).unwrap();
    let h1 = repo.insert(&new_heat("H1", 100.0, 1).into_heat(today())).unwrap();
    repo.set_remaining(&h1.heat_id, 20.0).unwrap();

    let updates = vec![
        RemainingUpdate {
            heat_id: "ghost".to_string(),
            expected_remaining_kg: 0.0,
            new_remaining_kg: 50.0,
        },
        RemainingUpdate {
            heat_id: h1.heat_id.clone(),
            expected_remaining_kg: 20.0,
            new_remaining_kg: 70.0,
        },
    ];

    let failed = repo.commit_remaining(&updates, MissingHeatPolicy::Fail);
    assert!(matches!(failed, Err(RepositoryError::NotFound { .. })));
    assert_eq!(repo.find_by_id(&h1.heat_id).unwrap().unwrap().remaining_kg, 20.0);

    let outcome = repo.commit_remaining(&updates, MissingHeatPolicy::Skip).unwrap();
    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.missing_heat_ids, vec!["ghost".to_string()]);
    assert_eq!(repo.find_by_id(&h1.heat_id).unwrap().unwrap().remaining_kg, 70.0);
}

#[test]
fn test_共享连接下的仓储协作() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared_connection(&db_path).unwrap();
    let heat_repo = HeatRepository::from_connection(conn.clone());
    let production_repo = ProductionRepository::from_connection(conn);

    heat_repo.insert(&new_heat("H1", 100.0, 1).into_heat(today())).unwrap();

    for (idx, (product, qty, kg)) in [("MK-V", 10u32, 11.5), ("MK-V", 20, 23.0), ("MK-III", 5, 4.65)]
        .into_iter()
        .enumerate()
    {
        production_repo
            .insert(&Production {
                production_id: format!("P{}", idx),
                production_date: NaiveDate::from_ymd_opt(2024, 4, 1 + idx as u32).unwrap(),
                product_type: product.to_string(),
                steel_type: SteelType::new(if product == "MK-V" { "23mm" } else { "20.64mm" }),
                quantity_produced: qty,
                material_consumed_kg: kg,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    let consumed = production_repo.total_consumed_for(&SteelType::new("23mm")).unwrap();
    assert!((consumed - 34.5).abs() < 1e-9);

    let totals = production_repo.totals_by_product_type().unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[1].product_type, "MK-V");
    assert_eq!(totals[1].total_quantity, 30);

    let recent = production_repo.list_recent(2).unwrap();
    assert_eq!(recent[0].production_id, "P2");
    assert_eq!(recent[1].production_id, "P1");

    let gauges = production_repo.list_steel_types().unwrap();
    assert_eq!(gauges, vec![SteelType::new("20.64mm"), SteelType::new("23mm")]);

    production_repo.delete("P0").unwrap();
    assert!(matches!(
        production_repo.delete("P0"),
        Err(RepositoryError::NotFound { .. })
    ));
    assert_eq!(heat_repo.list_steel_types().unwrap(), vec![SteelType::new("23mm")]);
}
