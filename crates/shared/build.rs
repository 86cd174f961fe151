fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/sushi_bar.proto");
    tonic_prost_build::compile_protos("proto/sushi_bar.proto")?;
    Ok(())
}
