use dotenv::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use smm_bot::bot::{callback_handler, message_handler, App};
use smm_bot::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting SMM assistant bot...");

    dotenv().ok();

    let config = Config::from_env()?;
    let bot = Bot::new(config.telegram_token.clone());
    let app = Arc::new(App::new(config));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let app = Arc::clone(&app);
            move |bot: Bot, msg: Message| {
                let app = Arc::clone(&app);
                async move { message_handler(bot, msg, app).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let app = Arc::clone(&app);
            move |bot: Bot, q: CallbackQuery| {
                let app = Arc::clone(&app);
                async move { callback_handler(bot, q, app).await }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
