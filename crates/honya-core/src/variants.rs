//! Traditional → Simplified Chinese character folding for series keys.
//!
//! Uploads of the same series are often titled in either script
//! ("海賊王" / "海贼王"). Folding lets the series grouper bucket them
//! together. The table covers characters common in gallery titles; it is
//! not a general converter and only maps one character to one character.

use phf::phf_map;

/// Compile-time lookup table, Traditional form → Simplified form.
static TRAD_TO_SIMP: phf::Map<char, char> = phf_map! {
    '賊' => '贼', '漢' => '汉', '話' => '话', '國' => '国', '學' => '学', '戰' => '战',
    '鬥' => '斗', '說' => '说', '劇' => '剧', '愛' => '爱', '戀' => '恋', '與' => '与',
    '對' => '对', '時' => '时', '間' => '间', '後' => '后', '們' => '们', '無' => '无',
    '會' => '会', '來' => '来', '個' => '个', '這' => '这', '裡' => '里', '裏' => '里',
    '開' => '开', '關' => '关', '門' => '门', '問' => '问', '聞' => '闻', '見' => '见',
    '視' => '视', '親' => '亲', '覺' => '觉', '觀' => '观', '長' => '长', '東' => '东',
    '車' => '车', '軍' => '军', '連' => '连', '運' => '运', '進' => '进', '過' => '过',
    '還' => '还', '達' => '达', '遠' => '远', '選' => '选', '邊' => '边', '龍' => '龙',
    '鳳' => '凤', '魚' => '鱼', '鳥' => '鸟', '馬' => '马', '風' => '风', '飛' => '飞',
    '雲' => '云', '電' => '电', '雙' => '双', '頭' => '头', '顏' => '颜', '題' => '题',
    '願' => '愿', '類' => '类', '體' => '体', '變' => '变', '隊' => '队', '陽' => '阳',
    '陰' => '阴', '動' => '动', '勝' => '胜', '務' => '务', '區' => '区', '協' => '协',
    '單' => '单', '衛' => '卫', '歷' => '历', '廳' => '厅', '場' => '场', '壞' => '坏',
    '夢' => '梦', '奪' => '夺', '婦' => '妇', '媽' => '妈', '孫' => '孙', '寫' => '写',
    '實' => '实', '將' => '将', '尋' => '寻', '導' => '导', '屬' => '属', '島' => '岛',
    '師' => '师', '帶' => '带', '幾' => '几', '廣' => '广', '張' => '张', '彈' => '弹',
    '從' => '从', '復' => '复', '徵' => '征', '憶' => '忆', '應' => '应', '戲' => '戏',
    '擊' => '击', '擔' => '担', '據' => '据', '敵' => '敌', '數' => '数', '斷' => '断',
    '書' => '书', '極' => '极', '樂' => '乐', '樓' => '楼', '機' => '机', '歡' => '欢',
    '歲' => '岁', '殺' => '杀', '殘' => '残', '氣' => '气', '淚' => '泪', '滅' => '灭',
    '為' => '为', '熱' => '热', '爺' => '爷', '獸' => '兽', '獄' => '狱', '現' => '现',
    '環' => '环', '產' => '产', '畫' => '画', '當' => '当', '發' => '发', '盜' => '盗',
    '盡' => '尽', '眾' => '众', '禮' => '礼', '種' => '种', '窮' => '穷', '競' => '竞',
    '筆' => '笔', '節' => '节', '級' => '级', '紀' => '纪', '約' => '约', '紅' => '红',
    '純' => '纯', '紙' => '纸', '細' => '细', '終' => '终', '組' => '组', '結' => '结',
    '絕' => '绝', '給' => '给', '統' => '统', '絲' => '丝', '經' => '经', '綠' => '绿',
    '網' => '网', '緣' => '缘', '練' => '练', '總' => '总', '織' => '织', '繪' => '绘',
    '續' => '续', '義' => '义', '習' => '习', '聖' => '圣', '聲' => '声', '聽' => '听',
    '職' => '职', '腦' => '脑', '臉' => '脸', '興' => '兴', '舊' => '旧', '華' => '华',
    '萬' => '万', '葉' => '叶', '蘭' => '兰', '處' => '处', '號' => '号', '蟲' => '虫',
    '術' => '术', '裝' => '装', '複' => '复', '襲' => '袭', '計' => '计', '記' => '记',
    '許' => '许', '設' => '设', '詩' => '诗', '試' => '试', '語' => '语', '誤' => '误',
    '調' => '调', '談' => '谈', '請' => '请', '論' => '论', '證' => '证', '識' => '识',
    '護' => '护', '讀' => '读', '讓' => '让', '貓' => '猫', '貝' => '贝', '負' => '负',
    '財' => '财', '貨' => '货', '買' => '买', '費' => '费', '資' => '资', '賣' => '卖',
    '質' => '质', '購' => '购', '贏' => '赢', '跡' => '迹', '輕' => '轻', '輪' => '轮',
    '轉' => '转', '農' => '农', '鄉' => '乡', '醫' => '医', '釋' => '释', '鈴' => '铃',
    '銀' => '银', '鋼' => '钢', '錄' => '录', '錯' => '错', '鍊' => '炼', '鏡' => '镜',
    '鐵' => '铁', '閃' => '闪', '閱' => '阅', '陣' => '阵', '險' => '险', '隨' => '随',
    '隱' => '隐', '難' => '难', '靈' => '灵', '靜' => '静', '響' => '响', '頁' => '页',
    '順' => '顺', '預' => '预', '領' => '领', '館' => '馆', '餘' => '余', '騎' => '骑',
    '驗' => '验', '驚' => '惊', '髮' => '发', '麗' => '丽', '黃' => '黄', '齊' => '齐',
    '齒' => '齿', '龜' => '龟', '雞' => '鸡', '娛' => '娱', '戶' => '户', '換' => '换',
    '億' => '亿', '優' => '优', '傳' => '传', '僕' => '仆', '價' => '价', '兒' => '儿',
    '內' => '内', '兩' => '两', '別' => '别', '則' => '则', '剛' => '刚', '勞' => '劳',
    '勢' => '势', '卻' => '却', '參' => '参', '員' => '员', '啟' => '启', '嚴' => '严',
    '園' => '园', '圍' => '围', '圖' => '图', '團' => '团', '壓' => '压', '夠' => '够',
    '寶' => '宝', '專' => '专', '層' => '层', '幫' => '帮', '彎' => '弯', '惡' => '恶',
    '慘' => '惨', '態' => '态', '憐' => '怜', '懷' => '怀', '擁' => '拥', '擇' => '择',
    '擴' => '扩', '敗' => '败', '斬' => '斩', '於' => '于', '暫' => '暂', '曉' => '晓',
    '權' => '权', '條' => '条', '樣' => '样', '橋' => '桥', '檢' => '检', '櫻' => '樱',
    '歸' => '归', '毀' => '毁', '決' => '决', '沒' => '没', '淨' => '净', '湯' => '汤',
    '溫' => '温', '滿' => '满', '潔' => '洁', '濕' => '湿', '災' => '灾', '點' => '点',
    '煙' => '烟', '燈' => '灯', '燒' => '烧', '爭' => '争', '牆' => '墙', '獨' => '独',
    '獲' => '获', '異' => '异', '瘋' => '疯', '盤' => '盘', '碼' => '码', '確' => '确',
    '禍' => '祸', '稱' => '称', '積' => '积', '緊' => '紧', '線' => '线', '編' => '编',
    '縣' => '县', '繼' => '继', '罰' => '罚', '羅' => '罗', '聯' => '联', '脫' => '脱',
    '腳' => '脚', '膚' => '肤', '艦' => '舰', '莊' => '庄', '蓋' => '盖', '藥' => '药',
    '虛' => '虚', '衝' => '冲', '補' => '补', '製' => '制', '觸' => '触', '訂' => '订',
    '訊' => '讯', '訪' => '访', '評' => '评', '詞' => '词', '詳' => '详', '認' => '认',
    '誘' => '诱', '課' => '课', '諸' => '诸', '謎' => '谜', '謝' => '谢', '譯' => '译',
    '議' => '议', '豐' => '丰', '豬' => '猪', '賀' => '贺', '賞' => '赏', '賭' => '赌',
    '贈' => '赠', '趕' => '赶', '躍' => '跃', '軟' => '软', '輝' => '辉', '辦' => '办',
    '遊' => '游', '遲' => '迟', '適' => '适', '遺' => '遗', '鄰' => '邻', '醜' => '丑',
    '鍵' => '键', '鎖' => '锁', '鐘' => '钟', '閉' => '闭', '閒' => '闲', '隻' => '只',
    '雜' => '杂', '離' => '离', '雖' => '虽', '霧' => '雾', '頂' => '顶', '項' => '项',
    '顧' => '顾', '飯' => '饭', '飲' => '饮', '養' => '养', '餓' => '饿', '驅' => '驱',
    '騙' => '骗', '鬧' => '闹', '鮮' => '鲜', '鴉' => '鸦', '鷹' => '鹰', '麥' => '麦',
    '黨' => '党', '齡' => '龄', '寢' => '寝', '姦' => '奸', '妳' => '你', '陸' => '陆',
    '貴' => '贵', '壯' => '壮', '獻' => '献', '錢' => '钱',};

/// Fold Traditional characters to their Simplified form.
pub fn fold_variants(s: &str) -> String {
    s.chars()
        .map(|c| TRAD_TO_SIMP.get(&c).copied().unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_traditional() {
        assert_eq!(fold_variants("海賊王"), "海贼王");
        assert_eq!(fold_variants("進擊的巨人"), "进击的巨人");
    }

    #[test]
    fn simplified_untouched() {
        assert_eq!(fold_variants("海贼王"), "海贼王");
    }

    #[test]
    fn non_cjk_untouched() {
        assert_eq!(fold_variants("One Piece 21話"), "One Piece 21话");
    }

    #[test]
    fn no_key_is_also_a_value() {
        // Folding must be idempotent.
        for (_, simp) in TRAD_TO_SIMP.entries() {
            assert!(!TRAD_TO_SIMP.contains_key(simp), "{simp} is both key and value");
        }
    }
}
