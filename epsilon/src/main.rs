use clap::Parser as ClapParser;
use std::process;

use epsilon::{HeapCreateInfo, VM, VMCreateInfo};

mod demos;

use demos::Demo;

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program to run
    #[arg(long, value_enum, default_value_t = Demo::Factorial)]
    demo: Demo,

    /// Entities allocated past the last live count before a collection runs
    #[arg(long)]
    gc_threshold: Option<usize>,

    /// List the available demos and exit
    #[arg(long)]
    list: bool,

    /// Print collector statistics after the run
    #[arg(long)]
    stats: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        for demo in Demo::all() {
            println!("{demo:?}");
        }
        return;
    }

    let mut vm = VM::new(VMCreateInfo {
        heap: HeapCreateInfo {
            gc_threshold: cli.gc_threshold,
            ..Default::default()
        },
        capture_output: false,
    });
    let program = cli.demo.build(&mut vm);
    log::info!("running {:?}", cli.demo);

    if let Err(err) = vm.start(&program) {
        eprintln!("Run-time error: {err}");
        process::exit(1);
    }

    if cli.stats {
        let stats = vm.gc_stats();
        println!(
            "collections: {}, freed: {}, live after last: {}, live now: {}",
            stats.collections,
            stats.freed,
            stats.live_after_last,
            vm.heap.live()
        );
    }
}
