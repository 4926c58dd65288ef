use std::env;
fn main() {
    dotenvy::dotenv().ok();

    let required_vars = ["DATABASE_URL"];
    let optional_vars = ["LIVE_GOLF_KEY", "CATALOG_API_KEY", "SYNC_TOKEN"];

    for &var in &required_vars {
        if env::var(var).is_err() {
            println!("cargo:warning=Required environment variable {} is not set.", var);
        }
    }

    for &var in &optional_vars {
        if env::var(var).is_err() {
            println!(
                "cargo:warning={} is not set, the routes depending on it will report a configuration error.",
                var
            );
        }
    }
    println!("cargo:rerun-if-changed=.env");
}
