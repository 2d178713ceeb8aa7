use sha2::Digest;

pub struct Sha1Digest {
    data: Vec<u8>,
}

impl Sha1Digest {
    pub fn new(data: &[u8]) -> Self {
        let mut hasher = sha1::Sha1::new();
        hasher.update(data);

        Self { data: hasher.finalize().to_vec() }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }
}

pub struct Sha256Digest {
    data: Vec<u8>,
}

impl Sha256Digest {
    pub fn new(data: &[u8]) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);

        Self { data: hasher.finalize().to_vec() }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }

    pub fn raw(&self) -> &[u8] {
        &self.data
    }
}

pub struct Sha512Digest {
    data: Vec<u8>,
}

impl Sha512Digest {
    pub fn new(data: &[u8]) -> Self {
        let mut hasher = sha2::Sha512::new();
        hasher.update(data);

        Self { data: hasher.finalize().to_vec() }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }

    pub fn to_base64(&self) -> String {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &self.data)
    }
}
