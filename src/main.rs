use base64::Engine;
use boothgen::{AspectRatio, GeminiClient, GeminiConfig, ImageClient};
use std::env;
use std::fs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    boothgen::logger::init_with_config(
        boothgen::logger::LoggerConfig::development()
            .with_level(boothgen::logger::LogLevel::Debug),
    )?;

    log::info!("🔍 Checking Gemini environment...");

    match env::var("GEMINI_API_KEY").or_else(|_| env::var("GOOGLE_API_KEY")) {
        Ok(key) => {
            log::info!("✅ Gemini API key found in environment");
            log::debug!("API key starts with: {}...", &key[..5.min(key.len())]);
        }
        Err(_) => {
            log::error!("❌ No GEMINI_API_KEY or GOOGLE_API_KEY set, generation will fail");
        }
    }

    let mut args = env::args().skip(1);
    let photo_path = args.next().unwrap_or_else(|| "photo.jpg".to_string());
    let prompt = args
        .next()
        .unwrap_or_else(|| "Cyberpunk city portrait, neon reflections".to_string());

    log::info!("🖼️  Available image generation models:");
    for (id, name, tier) in ImageClient::supported_models() {
        log::info!("  {} - {} ({:?} tier)", id, name, tier);
    }

    log::info!("🔄 Creating Gemini client...");
    let client = match GeminiClient::with_settings_file(GeminiConfig::from_env(), "pb_settings.json")
    {
        Ok(client) => {
            log::info!("✅ Gemini client initialized successfully");
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {}", e);
            return Err(e.into());
        }
    };

    log::info!("📷 Reading source photo: {}", photo_path);
    let photo_bytes = fs::read(&photo_path)?;
    let mime = if photo_path.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    };
    let source_image = format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(&photo_bytes)
    );

    log::info!("🎨 Generating stylized image...");
    log::info!("💬 Prompt: {}", prompt);

    match client
        .image()
        .generate_image(&source_image, &prompt, AspectRatio::default())
        .await
    {
        Ok(image_data_uri) => {
            log::info!("✅ Image generation successful!");
            log::info!("📏 Data URI length: {} characters", image_data_uri.len());

            let filename = format!("stylized_{}.png", chrono::Utc::now().timestamp());
            let payload = image_data_uri
                .split_once(',')
                .map(|(_, payload)| payload)
                .unwrap_or_default();

            match base64::engine::general_purpose::STANDARD.decode(payload) {
                Ok(image_bytes) => match fs::write(&filename, image_bytes) {
                    Ok(_) => log::info!("💾 Image saved to: {}", filename),
                    Err(e) => log::error!("❌ Failed to save image: {}", e),
                },
                Err(e) => log::error!("❌ Failed to decode base64 image: {}", e),
            }
        }
        Err(e) => {
            log::error!("❌ Image generation failed: {}", e);
            log::warn!("💡 Pro models need a billing-enabled project; flash works without one");
            return Err(e.into());
        }
    }

    log::info!("🎉 Done!");
    Ok(())
}
