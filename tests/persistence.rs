//! End-to-end persistence tests over the mock flash partition
//!
//! Exercises the full boot story: first boot on defaults, mutate, save,
//! power-cycle (new store over the same partition bytes), and recovery from
//! single- and dual-region corruption.

use nvparam::params::{
    ParamDesc, ParamError, ParamStore, BACKUP_OFFSET, PARAM_SECTOR_SIZE, PRIMARY_OFFSET,
};
use nvparam::platform::mock::MockFlash;
use nvparam::platform::traits::FlashPartition;

static TABLE: &[ParamDesc] = &[
    ParamDesc::string("car", 15, "wow"),
    ParamDesc::array("mac_addr", 6, "AB CD EF 01 02 03"),
    ParamDesc::int32("my_age", "25"),
    ParamDesc::int64("my_money", "56789123456789"),
    ParamDesc::hex32("reg_addr", "A001"),
    ParamDesc::hex64("reg_value", "12345678ABCDEF"),
    ParamDesc::float32("voltage", "12.34"),
    ParamDesc::float64("energy", "87654321.123"),
];

fn read_i32(store: &ParamStore<MockFlash>, name: &str) -> i32 {
    let mut buf = [0u8; 4];
    store.read_by_name(name, &mut buf).unwrap();
    i32::from_le_bytes(buf)
}

/// Power-cycle: tear the store down and bring a fresh one up over the same
/// partition contents
fn reboot(store: ParamStore<MockFlash>) -> ParamStore<MockFlash> {
    ParamStore::init_and_load(store.release(), TABLE).unwrap()
}

#[test]
fn first_boot_comes_up_on_defaults() {
    let store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();

    let mut car = [0u8; 16];
    store.read_by_name("car", &mut car).unwrap();
    assert_eq!(&car[..4], b"wow\0");

    let mut mac = [0u8; 6];
    store.read_by_name("mac_addr", &mut mac).unwrap();
    assert_eq!(mac, [0xAB, 0xCD, 0xEF, 0x01, 0x02, 0x03]);

    assert_eq!(read_i32(&store, "my_age"), 25);
    assert!(!store.is_dirty());
}

#[test]
fn every_kind_survives_a_power_cycle() {
    let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();

    store.write_by_name("car", b"fiat panda").unwrap();
    store.write_by_name("mac_addr", &[1, 2, 3, 4, 5, 6]).unwrap();
    store.write_by_name("my_age", &(-40i32).to_le_bytes()).unwrap();
    store
        .write_by_name("my_money", &(-9_876_543_210i64).to_le_bytes())
        .unwrap();
    store
        .write_by_name("reg_addr", &0xDEADBEEFu32.to_le_bytes())
        .unwrap();
    store
        .write_by_name("reg_value", &0x0123_4567_89AB_CDEFu64.to_le_bytes())
        .unwrap();
    store.write_by_name("voltage", &3.3f32.to_le_bytes()).unwrap();
    store
        .write_by_name("energy", &(-0.015625f64).to_le_bytes())
        .unwrap();

    store.save_to_flash().unwrap();
    let store = reboot(store);

    let mut car = [0u8; 16];
    store.read_by_name("car", &mut car).unwrap();
    assert_eq!(&car[..11], b"fiat panda\0");

    let mut mac = [0u8; 6];
    store.read_by_name("mac_addr", &mut mac).unwrap();
    assert_eq!(mac, [1, 2, 3, 4, 5, 6]);

    assert_eq!(read_i32(&store, "my_age"), -40);

    let mut money = [0u8; 8];
    store.read_by_name("my_money", &mut money).unwrap();
    assert_eq!(i64::from_le_bytes(money), -9_876_543_210);

    let mut addr = [0u8; 4];
    store.read_by_name("reg_addr", &mut addr).unwrap();
    assert_eq!(u32::from_le_bytes(addr), 0xDEADBEEF);

    let mut value = [0u8; 8];
    store.read_by_name("reg_value", &mut value).unwrap();
    assert_eq!(u64::from_le_bytes(value), 0x0123_4567_89AB_CDEF);

    let mut volts = [0u8; 4];
    store.read_by_name("voltage", &mut volts).unwrap();
    assert_eq!(f32::from_le_bytes(volts), 3.3);

    let mut energy = [0u8; 8];
    store.read_by_name("energy", &mut energy).unwrap();
    assert_eq!(f64::from_le_bytes(energy), -0.015625);
}

#[test]
fn corrupted_primary_falls_back_to_backup() {
    let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();
    store.write_by_name("my_age", &61i32.to_le_bytes()).unwrap();
    store.save_to_flash().unwrap();

    let mut flash = store.release();
    // Smash a stretch of the primary payload; its CRC no longer matches
    flash.inject_corruption(PRIMARY_OFFSET + 16, 8);

    let store = ParamStore::init_and_load(flash, TABLE).unwrap();
    assert_eq!(read_i32(&store, "my_age"), 61);
}

#[test]
fn both_regions_corrupt_boots_on_defaults() {
    let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();
    store.write_by_name("my_age", &61i32.to_le_bytes()).unwrap();
    store.save_to_flash().unwrap();

    let mut flash = store.release();
    flash.inject_corruption(PRIMARY_OFFSET, 2);
    flash.inject_corruption(BACKUP_OFFSET, 2);

    // init_and_load tolerates total corruption and keeps defaults
    let mut store = ParamStore::init_and_load(flash, TABLE).unwrap();
    assert_eq!(read_i32(&store, "my_age"), 25);
    assert_eq!(store.load_from_flash(), Err(ParamError::StorageUnavailable));
}

#[test]
fn save_writes_both_regions() {
    let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();
    store.write_by_name("my_age", &7i32.to_le_bytes()).unwrap();
    store.save_to_flash().unwrap();

    let flash = store.release();
    assert_eq!(flash.erase_count(PRIMARY_OFFSET), 1);
    assert_eq!(flash.erase_count(BACKUP_OFFSET), 1);

    // Identical complete record in both regions
    let record_len = nvparam::params::RecordHeader::SIZE + 58;
    assert_eq!(
        flash.contents(PRIMARY_OFFSET, record_len),
        flash.contents(BACKUP_OFFSET, record_len)
    );
}

#[test]
fn burst_of_writes_is_one_erase_per_region() {
    let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();

    for age in 0..50i32 {
        store.write_by_name("my_age", &age.to_le_bytes()).unwrap();
    }
    store.save_to_flash().unwrap();

    let flash = store.release();
    assert_eq!(flash.erase_count(PRIMARY_OFFSET), 1);
    assert_eq!(flash.erase_count(BACKUP_OFFSET), 1);
}

#[test]
fn width_violation_never_touches_the_field() {
    let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();

    assert_eq!(
        store.write_by_name("my_age", &[1, 2, 3]),
        Err(ParamError::InvalidArgument)
    );
    assert_eq!(read_i32(&store, "my_age"), 25);
    assert!(!store.is_dirty());
}

#[test]
fn narrow_write_sign_extends_into_the_field() {
    let mut store = ParamStore::init_and_load(MockFlash::new(), TABLE).unwrap();

    // One negative byte into the 4-byte field
    store.write_by_name("my_age", &[0xFFu8]).unwrap();
    assert_eq!(read_i32(&store, "my_age"), -1);

    // Widened 8-byte read of the same field
    let mut wide = [0u8; 8];
    store.read_by_name("my_age", &mut wide).unwrap();
    assert_eq!(i64::from_le_bytes(wide), -1);
}

#[test]
fn partition_reserves_two_sectors() {
    let flash = MockFlash::new();
    assert!(flash.capacity() >= BACKUP_OFFSET + PARAM_SECTOR_SIZE);
    assert_eq!(BACKUP_OFFSET, PRIMARY_OFFSET + flash.sector_size());
}
