pub fn invalidation_path(object_key: &str) -> String {
    format!("/{object_key}")
}

pub fn purge_endpoint(zone_id: &str) -> String {
    format!("https://api.cloudflare.com/client/v4/zones/{zone_id}/purge_cache")
}

pub fn purge_file_url(domain: &str, object_key: &str) -> String {
    format!("{domain}/{object_key}")
}
