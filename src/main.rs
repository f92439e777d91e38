//! Catch Rush headless demo
//!
//! Plays one seeded round with an autopilot cart and prints the round
//! summary as JSON.
//!
//! Usage: `catch-rush [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
use std::{env, error::Error, fs};

#[cfg(not(target_arch = "wasm32"))]
use catch_rush::sim::{Cart, EventLog, FallingItem, GameEngine, GameEvent, RoundPhase};
#[cfg(not(target_arch = "wasm32"))]
use catch_rush::{ManualClock, Tuning};

/// Longest round the demo will play before stopping it
#[cfg(not(target_arch = "wasm32"))]
const DEMO_LIMIT_MS: u64 = 5 * 60 * 1000;

#[cfg(not(target_arch = "wasm32"))]
const CART_WIDTH: f32 = 100.0;
#[cfg(not(target_arch = "wasm32"))]
const CART_HEIGHT: f32 = 40.0;
/// Autopilot horizontal speed (pixels per frame)
#[cfg(not(target_arch = "wasm32"))]
const CART_SPEED: f32 = 9.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse::<u64>()?,
        None => 42,
    };
    let tuning = match args.next() {
        Some(path) => Tuning::from_json(&fs::read_to_string(&path)?)?,
        None => Tuning::default(),
    };
    log::info!("Catch Rush demo starting (seed {seed})");

    let clock = ManualClock::new(0);
    let frame_ms = tuning.frame_ms;
    let mut cart = Cart::new(
        (tuning.play_width - CART_WIDTH) / 2.0,
        tuning.play_height - CART_HEIGHT - 60.0,
        CART_WIDTH,
        CART_HEIGHT,
    );
    let mut engine = GameEngine::new(tuning, EventLog::new(), clock.clone(), seed)?;
    engine.start()?;

    let mut elapsed = 0;
    while engine.phase() == RoundPhase::Active && elapsed < DEMO_LIMIT_MS {
        steer(&mut cart, engine.items(), engine.tuning().play_width);
        clock.advance(frame_ms);
        elapsed += frame_ms;
        engine.update(&cart);
    }

    let summary = match engine.summary() {
        Some(summary) => summary.clone(),
        None => engine.end()?,
    };
    let achievements = engine
        .sink()
        .count(|e| matches!(e, GameEvent::AchievementUnlocked(_)));
    log::info!(
        "Demo finished: {} events, {achievements} achievements, {} blockages left",
        engine.sink().events.len(),
        engine.blockages().len()
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Autopilot: chase the lowest catchable item, sidestep hazards above the cart
#[cfg(not(target_arch = "wasm32"))]
fn steer(cart: &mut Cart, items: &[FallingItem], play_width: f32) {
    let center = cart.center_x();
    let reach = cart.size.x;

    let threat = items
        .iter()
        .filter(|item| item.kind.is_hazard() && item.bottom() > cart.pos.y - 200.0)
        .filter(|item| (item.pos.x - center).abs() < reach)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    let target_x = if let Some(hazard) = threat {
        // Step to whichever side has more room
        if (hazard.pos.x > center && center - reach > 0.0) || center + reach > play_width {
            hazard.pos.x - reach * 1.2
        } else {
            hazard.pos.x + reach * 1.2
        }
    } else {
        items
            .iter()
            .filter(|item| !item.kind.is_hazard() && item.top() < cart.pos.y + cart.size.y)
            .max_by(|a, b| {
                let score = |item: &FallingItem| item.pos.y + if item.kind.is_valuable() { 120.0 } else { 0.0 };
                score(a).total_cmp(&score(b))
            })
            .map_or(play_width / 2.0, |item| item.pos.x)
    };

    let step = (target_x - center).clamp(-CART_SPEED, CART_SPEED);
    cart.pos.x = (cart.pos.x + step).clamp(0.0, (play_width - cart.size.x).max(0.0));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; the host page drives it
}
