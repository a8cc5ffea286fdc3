/// Lua script for inserting a session unless a live one holds the key.
///
/// KEYS\[1\] = the session hash key
/// KEYS\[2\] = the expiry index key
/// ARGV\[1\] = session id
/// ARGV\[2\] = expiry in Unix milliseconds
/// ARGV\[3\] = session JSON
/// ARGV\[4\] = now in Unix milliseconds
/// ARGV\[5\] = hash lifetime in milliseconds
/// ARGV\[6\] = index member (`kind:code`)
/// ARGV\[7\] = `1` if an expired record may be overwritten, `0` if it must
///             wait for `PURGE_EXPIRED`
///
/// Returns 1 if the session was stored, 0 if the key is held.
pub const CREATE: &str = r"
local cur = redis.call('HGET', KEYS[1], 'exp')
if cur and (ARGV[7] == '0' or tonumber(cur) > tonumber(ARGV[4])) then
    return 0
end
redis.call('DEL', KEYS[1])
redis.call('HSET', KEYS[1], 'id', ARGV[1], 'exp', ARGV[2], 'v', ARGV[3])
redis.call('PEXPIRE', KEYS[1], ARGV[5])
redis.call('ZADD', KEYS[2], ARGV[2], ARGV[6])
return 1
";

/// Lua script for atomically reading and deleting a live session.
///
/// KEYS\[1\] = the session hash key
/// KEYS\[2\] = the expiry index key
/// ARGV\[1\] = now in Unix milliseconds
/// ARGV\[2\] = index member (`kind:code`)
///
/// Returns the session JSON, or nil if absent or expired. Expired records
/// are left for `PURGE_EXPIRED`.
pub const TAKE: &str = r"
local vals = redis.call('HMGET', KEYS[1], 'exp', 'v')
if not vals[1] then
    return false
end
if tonumber(vals[1]) <= tonumber(ARGV[1]) then
    return false
end
redis.call('DEL', KEYS[1])
redis.call('ZREM', KEYS[2], ARGV[2])
return vals[2]
";

/// Lua script for deleting a session only if it still has the given id.
///
/// KEYS\[1\] = the session hash key
/// KEYS\[2\] = the expiry index key
/// ARGV\[1\] = expected session id
/// ARGV\[2\] = index member (`kind:code`)
///
/// Returns 1 if deleted, 0 if missing or owned by another session.
pub const DELETE: &str = r"
local cur = redis.call('HGET', KEYS[1], 'id')
if cur ~= ARGV[1] then
    return 0
end
redis.call('DEL', KEYS[1])
redis.call('ZREM', KEYS[2], ARGV[2])
return 1
";

/// Lua script for removing one batch of expired sessions.
///
/// KEYS\[1\] = the expiry index key
/// ARGV\[1\] = now in Unix milliseconds
/// ARGV\[2\] = session key prefix (`prefix:session:`)
/// ARGV\[3\] = maximum index entries to process
///
/// Returns a two-element array: the number of index entries processed and
/// the JSON of every session removed. Index entries whose hash is gone (taken
/// or reclaimed by Redis) are dropped without a result.
pub const PURGE_EXPIRED: &str = r"
local members = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, tonumber(ARGV[3]))
local removed = {}
for _, member in ipairs(members) do
    local key = ARGV[2] .. member
    local vals = redis.call('HMGET', key, 'exp', 'v')
    redis.call('ZREM', KEYS[1], member)
    if vals[1] and tonumber(vals[1]) <= tonumber(ARGV[1]) then
        redis.call('DEL', key)
        table.insert(removed, vals[2])
    end
end
return {#members, removed}
";
