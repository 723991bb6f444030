fn main() -> std::process::ExitCode {
    catclient_lib::run()
}
