use rand::prelude::IteratorRandom;
use rand::{random, thread_rng};
use tempfile::tempdir;
use tapesort::{sort_tape, Record, WriteBuffer, WriteMode};

fn main() {
    let dir = tempdir().unwrap();
    let tape = dir.path().join("tape");
    let scratch_a = dir.path().join("t2");
    let scratch_b = dir.path().join("t3");

    const RECORDS: usize = 5_000;

    let mut writer = WriteBuffer::open(&tape, WriteMode::Truncate).unwrap();
    for _ in 0..RECORDS {
        let item_count = (1..=15usize).choose(&mut thread_rng()).unwrap();
        let items: Vec<i32> = (0..item_count).map(|_| random::<u8>() as i32).collect();
        writer.write_next(Record::try_new(&items).unwrap()).unwrap();
    }
    writer.flush().unwrap();

    println!("wrote {RECORDS} records, sorting...");

    let info = sort_tape(&tape, &scratch_a, &scratch_b, true).unwrap();

    println!(
        "sorted in {} phase(s), {} disk read(s), {} disk write(s)",
        info.phases, info.reads, info.writes
    );
}
