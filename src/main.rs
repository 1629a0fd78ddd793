use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::EventStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cga_bridge::bridge::{spawn_input_pump, ProcessShutdown, ShutdownHooks};
use cga_bridge::renderer::{TerminalGuard, TEXT_ROWS};
use cga_bridge::{Bridge, BridgeConfig, DrawRequest, Scancode, ScancodeEvent, TerminalSurface};

const FRAME_INTERVAL: Duration = Duration::from_millis(50);
/// Half period of the CGA blink clock.
const BLINK_HALF_PERIOD_MS: u128 = 500;

/// Drive the CGA terminal bridge with a built-in test card.
#[derive(Parser, Debug)]
#[command(name = "cga-bridge", version, about)]
struct Args {
    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where to write logs; the terminal itself is the display
    #[arg(long, value_name = "PATH", default_value = "cga-bridge.log")]
    log_file: PathBuf,

    /// Text mode width (40 or 80)
    #[arg(long, default_value_t = 80, value_parser = parse_columns)]
    columns: usize,
}

fn parse_columns(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n @ (40 | 80)) => Ok(n),
        _ => Err(format!("expected 40 or 80, got {s}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let config = load_config(args.config.as_deref())?;
    info!("Starting cga-bridge ({} columns) with {:?}", args.columns, config);

    let guard = TerminalGuard::enter(&config).context("failed to prepare terminal")?;
    let surface = TerminalSurface::stdout()
        .context("failed to query terminal size")?
        .with_true_color(config.true_color);

    let shutdown: Arc<dyn ShutdownHooks> = Arc::new(ProcessShutdown);
    let (handle, mut bridge_task) = Bridge::spawn(surface, config.clone(), shutdown);
    spawn_input_pump(EventStream::new(), handle.sender(), config.quit_key);

    let machine = Arc::new(Mutex::new(TestCard::new(args.columns)));

    let keys = machine.clone();
    handle
        .register_keyboard_handler(move |event| {
            if let Ok(mut card) = keys.lock() {
                card.key(event);
            }
        })
        .await;

    let pointer = machine.clone();
    handle
        .register_mouse_handler(move |buttons, dx, dy| {
            if let Ok(mut card) = pointer.lock() {
                card.mouse(buttons, dx, dy);
            }
        })
        .await;

    let started = Instant::now();
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);

    let exit = loop {
        tokio::select! {
            exit = &mut bridge_task => break exit.context("bridge task failed")?,
            _ = ticker.tick() => {
                let blink = (started.elapsed().as_millis() / BLINK_HALF_PERIOD_MS) % 2 == 0;
                let request = match machine.lock() {
                    Ok(mut card) => card.frame(blink),
                    Err(_) => break cga_bridge::LoopExit::Disconnected,
                };
                if let Err(e) = handle.post_draw_request(request) {
                    warn!("Frame not posted: {}", e);
                }
            }
        }
    };

    drop(guard);
    info!("Bridge stopped: {:?}", exit);
    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match BridgeConfig::default_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(BridgeConfig::default()),
        },
    };

    info!("Loading configuration from {}", path.display());
    BridgeConfig::load(&path).with_context(|| format!("invalid configuration {}", path.display()))
}

/// A fake machine that owns text-mode video memory.
struct TestCard {
    columns: usize,
    mem: Vec<u8>,
    border: u8,
    last_key: Option<ScancodeEvent>,
    pointer: (i32, i32),
    buttons: u8,
}

impl TestCard {
    fn new(columns: usize) -> Self {
        let mut card = Self {
            columns,
            mem: vec![0; columns * TEXT_ROWS * 2],
            border: 1,
            last_key: None,
            pointer: (0, 0),
            buttons: 0,
        };
        card.draw_static();
        card
    }

    fn put_str(&mut self, x: usize, y: usize, text: &str, attr: u8) {
        for (i, b) in text.bytes().enumerate() {
            if x + i >= self.columns {
                break;
            }
            let offset = (y * self.columns + x + i) * 2;
            self.mem[offset] = b;
            self.mem[offset + 1] = attr;
        }
    }

    fn clear_row(&mut self, y: usize, attr: u8) {
        let blank = " ".repeat(self.columns);
        self.put_str(0, y, &blank, attr);
    }

    fn draw_static(&mut self) {
        self.clear_row(0, 0x1F);
        self.put_str(1, 0, "CGA bridge test card", 0x1F);

        // every attribute byte, 16 per row
        let width = self.columns / 16;
        for attr in 0..=255u8 {
            let x = (attr as usize % 16) * width;
            let y = 2 + attr as usize / 16;
            let label = if width >= 3 {
                format!("{:02X}{}", attr, " ".repeat(width - 2))
            } else {
                "\u{4}".repeat(width)
            };
            self.put_str(x, y, &label, attr);
        }

        self.put_str(0, 24, "F12 quit  Tab border", 0x70);
    }

    fn key(&mut self, event: ScancodeEvent) {
        if event.scancode == Scancode::Tab && !event.released {
            self.border = (self.border + 1) & 0xF;
        }
        self.last_key = Some(event);
    }

    fn mouse(&mut self, buttons: u8, dx: i8, dy: i8) {
        self.buttons = buttons;
        self.pointer.0 += i32::from(dx);
        self.pointer.1 += i32::from(dy);
    }

    fn frame(&mut self, blink: bool) -> DrawRequest {
        let key = match self.last_key {
            Some(ev) => format!("key {:?} byte {:02X}", ev.scancode, ev.to_byte()),
            None => "key -".to_string(),
        };
        let mouse = format!(
            "mouse {:02b} {},{}",
            self.buttons, self.pointer.0, self.pointer.1
        );

        self.clear_row(19, 0x07);
        self.put_str(0, 19, &key, 0x0E);
        self.clear_row(20, 0x07);
        self.put_str(0, 20, &mouse, 0x0B);
        self.put_str(0, 22, "blinking", 0xCF);

        DrawRequest {
            buffer: self.mem.clone(),
            blink,
            border: self.border,
            cursor_x: key.len().min(self.columns - 1) as i32,
            cursor_y: 19,
        }
    }
}
