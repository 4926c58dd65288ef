use api::launch;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rocket = launch().await?;
    rocket.launch().await?;
    Ok(())
}
