use std::process;

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_json;
#[macro_use]
extern crate lazy_static;

use std::env;
use std::path::Path;
use std::str::FromStr;

use alloy_primitives::Address;
use anyhow::{anyhow, bail, Result};

mod abi;
mod codec;
mod feed;
mod handlers;
mod imagedata;
mod ledger;
mod processor;
mod rpc;
mod settings;
mod util;

lazy_static! {
    static ref SETTINGS: settings::Settings = settings::Settings::load().unwrap();
}

fn main() {
    env_logger::init();
    let _sentry_guard = init_sentry();

    let args: Vec<String> = env::args().collect();
    check_or_show_usage(&args);

    let command: &str = &args[1];
    info!("run command = {}", command);

    let result = match command {
        "feed" => run_feed(),
        "myposts" => run_myposts(),
        "create" => run_create(&args[2..]),
        "tip" => run_tip(&args[2..]),
        "web" => run_web(),
        _ => {
            check_or_show_usage(&[]);
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{} failed: {}", command, e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn init_sentry() -> Option<sentry::ClientInitGuard> {
    match &SETTINGS.app.sentry_dsn {
        Some(dsn) => Some(sentry::init(dsn.as_str())),
        None => {
            debug!("no app.sentry_dsn configured, skip sentry integration");
            None
        }
    }
}

fn check_or_show_usage(args: &[String]) {
    let usage = format!(
        "usage: {} <feed|myposts|create|tip|web>",
        args.get(0).map(String::as_str).unwrap_or("tippol")
    );
    if args.len() <= 1 {
        println!("{}", usage);
        process::exit(0);
    }
}

fn run_feed() -> Result<()> {
    rpc::check_chain(&SETTINGS);
    let feed = feed::global_feed(&SETTINGS);
    if feed.source == feed::FeedSource::Fixture {
        println!("(chain unavailable - showing example posts)\n");
    }
    render_posts(&feed.posts);
    Ok(())
}

fn run_myposts() -> Result<()> {
    let wallet = SETTINGS
        .wallet_address()
        .ok_or_else(|| anyhow!("no wallet connected - set [wallet] address in Settings.toml"))?;
    let viewer = Address::from_str(wallet)
        .map_err(|_| anyhow!("configured wallet address {} is not valid", wallet))?;

    rpc::check_chain(&SETTINGS);
    let posts = feed::personal_feed(&SETTINGS, &viewer);
    if posts.is_empty() {
        println!("You haven't shared any achievements yet.");
        return Ok(());
    }
    render_posts(&posts);
    Ok(())
}

fn run_create(args: &[String]) -> Result<()> {
    if args.len() < 2 {
        bail!("usage: tippol create <achievement> <description> [image-file]");
    }
    let achievement = &args[0];
    let text = &args[1];
    let image = match args.get(2) {
        Some(path) => Some(imagedata::encode_image_file(Path::new(path))?),
        None => None,
    };

    rpc::check_chain(&SETTINGS);
    let tx_hash = processor::submit_post(&SETTINGS, achievement, text, image.as_deref())?;
    println!("post created, tx = {}\n", tx_hash);

    // land on a fresh global feed, as the original did after publishing
    let feed = feed::global_feed(&SETTINGS);
    render_posts(&feed.posts);
    Ok(())
}

fn run_tip(args: &[String]) -> Result<()> {
    if args.len() < 2 {
        bail!("usage: tippol tip <post-id> <amount>");
    }
    let post_id = &args[0];
    let amount = &args[1];

    rpc::check_chain(&SETTINGS);
    let feed = feed::global_feed(&SETTINGS);
    let mut post = feed
        .posts
        .iter()
        .find(|post| &post.id == post_id)
        .cloned()
        .ok_or_else(|| anyhow!("post {} not found on the feed", post_id))?;

    if !feed::can_tip(SETTINGS.wallet_address(), &post) {
        bail!("you can not tip your own post");
    }

    let receipt = processor::submit_tip(&SETTINGS, post_id, amount)?;
    feed::apply_tip(&mut post, receipt.amount_pol);
    println!(
        "tipped {} POL to {} (tx = {}), post now has {} tips totalling {:.3} POL",
        amount, post.author, receipt.tx_hash, post.tips, post.tip_amount
    );
    Ok(())
}

fn render_posts(posts: &[feed::Post]) {
    if posts.is_empty() {
        println!("No posts yet. Be the first to share an achievement!");
        return;
    }
    for post in posts {
        let (text, image) = codec::decode_description(&post.description);
        println!("#{} {} - {}", post.id, post.author, post.timestamp);
        println!("  {}", post.achievement);
        println!("  {}", text);
        if image.is_some() {
            println!("  [image attached]");
        }
        println!("  {} tips, {:.3} POL", post.tips, post.tip_amount);
        println!();
    }
}

fn run_web() -> Result<()> {
    serve()?;
    Ok(())
}

#[actix_web::main]
async fn serve() -> std::io::Result<()> {
    use actix_web::{middleware, web, App, HttpServer};

    let bind_address = SETTINGS.app.bind_address.clone();
    info!("serving feeds on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(SETTINGS.clone()))
            .service(web::resource("/posts").route(web::get().to(handlers::posts::list_all)))
            .service(
                web::resource("/posts/{address}")
                    .route(web::get().to(handlers::posts::list_by_author)),
            )
    })
    .bind(&bind_address)
    .unwrap_or_else(|_| panic!("can not bind to {}", &bind_address))
    .run()
    .await
}
