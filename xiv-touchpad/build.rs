use std::env;

fn main() {
    if env::var("CARGO_CFG_TARGET_OS").unwrap() == "windows" {
        // Embed version metadata into the DLL
        let res = winres::WindowsResource::new();
        res.compile().unwrap();
    }
}
