//! Job Tests
//!
//! Both jobs wired end to end against canned quote, weather, image and
//! Bot API servers.

mod common;

use std::path::Path;
use std::time::Duration;

use chrono_tz::Asia::Shanghai;
use common::{form_field, Canned, CannedServer};
use daybreak::adapters::{
    BingImageCreator, DefaultAsset, EdgeTts, QuoteClient, TelegramClient, WeatherClient,
};
use daybreak::config::{BingCredentials, ImageDelivery, ImageSettings, Secret};
use daybreak::core::{Delivery, Jobs, VOICE_TITLE};
use daybreak::domain::{QUOTE_LABEL, WAKE_UP_LABEL};
use daybreak::{ChannelDispatcher, FallbackChain};
use tempfile::TempDir;

const QUOTE: &str = "Spring sleep knows no dawn";

fn jobs(
    quote: &CannedServer,
    weather: &CannedServer,
    bing: &CannedServer,
    telegram: &CannedServer,
    root: &Path,
) -> Jobs<TelegramClient> {
    let client = reqwest::Client::new();
    let work_dir = root.join("tmp");

    let creator = BingImageCreator::new(
        BingCredentials {
            auth_cookie: Secret::new("u-cookie"),
            identity_cookie: None,
        },
        &work_dir,
        ImageSettings {
            delivery: ImageDelivery::RandomOne,
            poll_interval: Duration::from_millis(5),
            max_polls: 3,
        },
        Duration::from_secs(2),
    )
    .unwrap()
    .with_base_url(&bing.base_url);

    Jobs {
        quotes: QuoteClient::new(client.clone()).with_endpoint(quote.url("/one.json")),
        weather: WeatherClient::new(client, Some(Secret::new("w-key")), "shanghai")
            .with_endpoint(weather.url("/v3/weather/now.json")),
        chain: FallbackChain::new(
            vec![Box::new(creator)],
            DefaultAsset::new(root.join("default.jpeg")),
        )
        .with_work_dir(&work_dir),
        tts: EdgeTts::default(),
        dispatcher: ChannelDispatcher::new(
            TelegramClient::new(Secret::new("TOKEN"), "-100123".to_string())
                .unwrap()
                .with_api_base(&telegram.base_url),
        ),
        time_zone: Shanghai,
        voice_dir: root.join("outputs"),
    }
}

fn quote_server_script(_: &str) -> Vec<Canned> {
    vec![Canned::json(
        "200 OK",
        format!(r#"{{"status":"success","data":{{"content":"{}"}}}}"#, QUOTE),
    )]
}

fn weather_server_script(_: &str) -> Vec<Canned> {
    vec![Canned::json(
        "200 OK",
        r#"{"results":[{"now":{"text":"多云","code":"4","temperature":"18"}}]}"#,
    )]
}

fn sent_message(id: i64) -> Canned {
    Canned::json("200 OK", format!(r#"{{"ok":true,"result":{{"message_id":{}}}}}"#, id))
}

#[tokio::test]
async fn test_wake_up_posts_illustrated_quote() {
    let temp = TempDir::new().unwrap();
    let quote = CannedServer::start(quote_server_script).await;
    let weather = CannedServer::start(weather_server_script).await;
    let bing = CannedServer::start(|base| {
        vec![
            Canned::redirect("/images/create?id=req-1"),
            Canned::json(
                "200 OK",
                format!(r#"<img class="mimg" src="{}/th/a.jpg?w=270" />"#, base),
            ),
            Canned::bytes(b"illustration".to_vec()),
        ]
    })
    .await;
    let telegram = CannedServer::start(|_| vec![sent_message(42)]).await;

    let delivery = jobs(&quote, &weather, &bing, &telegram, temp.path())
        .wake_up()
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Photo { message_id: 42 });

    // The quote is the image prompt
    let submission = &bing.requests()[0];
    assert!(submission.starts_with("POST /images/create?q=Spring%20sleep%20knows%20no%20dawn&rt=4"));

    let weather_request = &weather.requests()[0];
    assert!(weather_request.contains("location=shanghai"));

    let request = &telegram.raw_requests()[0];
    assert!(request.starts_with("POST /botTOKEN/sendPhoto "));
    assert_eq!(form_field(request, "photo").as_deref(), Some("illustration"));

    let caption = form_field(request, "caption").unwrap();
    assert!(caption.starts_with(WAKE_UP_LABEL));
    assert!(caption.contains("\n\n今天天气:多云,温度:18度\n\n"));
    assert!(caption.ends_with(&format!("{}{}", QUOTE_LABEL, QUOTE)));
}

#[tokio::test]
async fn test_wake_up_sends_default_image_when_providers_fail() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("default.jpeg"), b"default-image").unwrap();

    let quote = CannedServer::start(|_| vec![Canned::json("500 Internal Server Error", "")]).await;
    let weather = CannedServer::start(|_| vec![Canned::json("403 Forbidden", "{}")]).await;
    let bing = CannedServer::start(|_| {
        vec![
            Canned::json("500 Internal Server Error", "boom"),
            Canned::json("500 Internal Server Error", "boom"),
        ]
    })
    .await;
    let telegram = CannedServer::start(|_| vec![sent_message(7)]).await;

    let delivery = jobs(&quote, &weather, &bing, &telegram, temp.path())
        .wake_up()
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Photo { message_id: 7 });

    // Default quote used as the prompt
    assert!(bing.requests()[0].contains(&urlencoding::encode("早上好").to_string()));

    let request = &telegram.raw_requests()[0];
    assert_eq!(form_field(request, "photo").as_deref(), Some("default-image"));
    let caption = form_field(request, "caption").unwrap();
    assert!(caption.contains("\n\n今天天气:晴\n\n"));
    assert!(caption.ends_with("今日诗词:早上好"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_yesterday_posts_narration() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let fake_tts = temp.path().join("edge-tts");
    std::fs::write(
        &fake_tts,
        "#!/bin/sh\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--write-media\" ]; then printf 'ID3-narration' > \"$2\"; fi\n  shift\ndone\n",
    )
    .unwrap();
    std::fs::set_permissions(&fake_tts, std::fs::Permissions::from_mode(0o755)).unwrap();

    let idle = CannedServer::start(|_| Vec::new()).await;
    let telegram = CannedServer::start(|_| vec![sent_message(11)]).await;

    let mut jobs = jobs(&idle, &idle, &idle, &telegram, temp.path());
    jobs.tts = EdgeTts::default().with_binary_path(fake_tts.to_string_lossy());

    let delivery = jobs.read_yesterday("读了三篇文章").await.unwrap();
    assert_eq!(delivery, Delivery::Audio { message_id: 11 });

    let voice_files: Vec<String> = std::fs::read_dir(temp.path().join("outputs"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(voice_files.len(), 1);
    assert!(voice_files[0].ends_with(".mp3"));
    assert_eq!(voice_files[0].len(), "2024-01-01.mp3".len());

    let request = &telegram.raw_requests()[0];
    assert!(request.starts_with("POST /botTOKEN/sendAudio "));
    assert_eq!(form_field(request, "title").as_deref(), Some(VOICE_TITLE));
    assert_eq!(form_field(request, "caption").as_deref(), Some(VOICE_TITLE));
    assert_eq!(form_field(request, "parse_mode").as_deref(), Some("Markdown"));
    assert_eq!(form_field(request, "audio").as_deref(), Some("ID3-narration"));
}
