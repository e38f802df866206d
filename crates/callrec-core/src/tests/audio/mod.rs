mod encoder;
mod settings;
