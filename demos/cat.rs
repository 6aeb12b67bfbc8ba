use std::fs::OpenOptions;
use std::io::Write;

use sdfat::{BlockDevice, FatFs, FilebackedBlockDevice, PartitionSelector};

/// Prints a file from a card image: `cargo run --features std --example cat -- card.img /docs/readme.txt`
fn main() {
    // to enable logging:
    // use env_logger::Env;
    // env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let mut args = std::env::args().skip(1);
    let image_path = args.next().unwrap_or_else(|| "/tmp/sdfat/card.img".to_string());
    let file_path = args.next().unwrap_or_else(|| "/README.TXT".to_string());

    let mut fbd = FilebackedBlockDevice {
        image: OpenOptions::new().read(true).open(&image_path).unwrap(),
    };
    fbd.card_init().unwrap();

    let mut fs = FatFs::new(fbd);
    let volume = fs.locate_filesystem(PartitionSelector::Any).unwrap();
    eprintln!(
        "Partition {}: {} sectors per cluster, root at cluster {}",
        volume.partition.number, volume.sectors_per_cluster, volume.root_cluster
    );

    let handle = match fs.open(&file_path) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{}: {} (status {})", file_path, err, err.code());
            std::process::exit(1);
        }
    };
    eprintln!("{:?}", fs.entry(handle).unwrap());

    let mut stdout = std::io::stdout();
    let mut buf = [0u8; 512];
    loop {
        let read = fs.read(handle, &mut buf).unwrap();
        if read == 0 {
            break;
        }
        stdout.write_all(&buf[..read]).unwrap();
    }
    fs.close(handle);
}
