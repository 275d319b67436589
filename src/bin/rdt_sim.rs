//! 单连接可靠传输实验
//!
//! 在一条可丢包、损坏、复制、乱序的信道上运行 GBN 或简化 TCP，打印交付与重传统计。

use clap::Parser;
use rdt_rs::app::AppSource;
use rdt_rs::net::NetWorld;
use rdt_rs::proto::Protocol;
use rdt_rs::sim::{ConfigError, ScenarioSpec, Simulator};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "rdt-sim", about = "不可靠信道上的可靠传输仿真（GBN / 简化 TCP）")]
struct Args {
    /// scenario.json；命令行参数覆盖文件中的同名字段
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// 协议：gbn 或 tcp
    #[arg(long)]
    protocol: Option<Protocol>,

    /// 发送窗口（包个数），0 表示不流控
    #[arg(long)]
    window: Option<u64>,

    /// TCP 慢启动阈值初值（包个数）
    #[arg(long)]
    ssthresh: Option<u64>,

    /// 重传超时（毫秒）
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// 信道单向时延（毫秒）
    #[arg(long)]
    delay_ms: Option<u64>,

    /// 信道时延抖动上限（毫秒），非零时产生乱序
    #[arg(long)]
    jitter_ms: Option<u64>,

    /// 丢包概率
    #[arg(long)]
    loss: Option<f64>,

    /// 损坏概率
    #[arg(long)]
    corrupt: Option<f64>,

    /// 复制概率
    #[arg(long)]
    duplicate: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// 逗号分隔的消息列表
    #[arg(long, value_delimiter = ',')]
    messages: Option<Vec<String>>,

    /// 未给出消息列表时自动生成的消息条数
    #[arg(long)]
    message_count: Option<u64>,

    /// 应用层两次提交之间的间隔（毫秒）
    #[arg(long)]
    send_interval_ms: Option<u64>,

    /// 仿真运行到多少毫秒；不填则运行到结束
    #[arg(long)]
    until_ms: Option<u64>,

    /// 输出可视化 JSON 事件文件；不填则不生成
    #[arg(long)]
    viz_json: Option<PathBuf>,
}

fn build_scenario(args: &Args) -> Result<ScenarioSpec, ConfigError> {
    let mut spec = match &args.scenario {
        Some(path) => ScenarioSpec::load(path)?,
        None => ScenarioSpec::new(args.protocol.unwrap_or(Protocol::Gbn)),
    };
    if let Some(p) = args.protocol {
        spec.protocol = p;
    }
    if let Some(v) = args.window {
        spec.window_size = v;
    }
    if let Some(v) = args.ssthresh {
        spec.ssthresh = v;
    }
    if let Some(v) = args.timeout_ms {
        spec.timeout_ms = v;
    }
    if let Some(v) = args.delay_ms {
        spec.channel.delay_ms = v;
    }
    if let Some(v) = args.jitter_ms {
        spec.channel.jitter_ms = v;
    }
    if let Some(v) = args.loss {
        spec.channel.loss = v;
    }
    if let Some(v) = args.corrupt {
        spec.channel.corrupt = v;
    }
    if let Some(v) = args.duplicate {
        spec.channel.duplicate = v;
    }
    if let Some(v) = args.seed {
        spec.seed = v;
    }
    if let Some(v) = &args.messages {
        spec.messages = v.clone();
    }
    if let Some(v) = args.message_count {
        spec.message_count = v;
    }
    if let Some(v) = args.send_interval_ms {
        spec.send_interval_ms = v;
    }
    if args.until_ms.is_some() {
        spec.until_ms = args.until_ms;
    }
    spec.validate()?;
    Ok(spec)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let spec = match build_scenario(&args) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut sim = Simulator::default();
    let mut world = NetWorld::from_scenario(&spec);
    if args.viz_json.is_some() {
        world.net.enable_viz();
        world.net.emit_viz_meta(&spec);
    }
    world
        .net
        .start_source(AppSource::from_scenario(&spec), &mut sim);

    sim.run_until(spec.until(), &mut world);

    if let Some(path) = &args.viz_json {
        if let Some(v) = world.net.take_viz() {
            let json = serde_json::to_string_pretty(&v.events).expect("serialize viz events");
            fs::write(path, json).expect("write viz json");
            eprintln!("wrote viz events to {}", path.display());
        }
    }

    let net = &world.net;
    let s = net.sender.stats();
    let r = net.receiver.stats();
    let st = net.stats();
    println!(
        "done @ {}\n  conn: protocol={}, finished={}, done_at={:?}, delivered={}, last_delivery={:?}, order_violations={}\n  sender: data_sent={}, timeouts={}, timeout_retransmits={}, fast_retransmits={}, acks={}, dup_acks={}, bad_acks={}, window={}\n  receiver: acks_sent={}, corrupt={}, duplicates={}, out_of_order_dropped={}, buffered={}\n  channel: transmitted={}, dropped={}, corrupted={}, duplicated={}",
        sim.now(),
        spec.protocol,
        net.is_done(),
        net.done_time().map(|t| t.to_string()),
        net.sink().len(),
        net.sink().last_delivery().map(|t| t.to_string()),
        net.sink().violations(),
        s.data_sent,
        s.timeouts,
        s.timeout_retransmits,
        s.fast_retransmits,
        s.acks_received,
        s.dup_acks,
        s.bad_acks,
        net.sender.window_size(),
        r.acks_sent,
        r.corrupt,
        r.duplicates,
        r.out_of_order_dropped,
        r.buffered,
        st.transmitted_pkts,
        st.dropped_pkts,
        st.corrupted_pkts,
        st.duplicated_pkts,
    );

    if net.sink().violations() > 0 {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
